//! Breadcrumb trail with insertion and removal at either end.

use crate::config::BreadcrumbConfig;
use crate::types::{BreadcrumbItem, Position};
use maud::{Markup, PreEscaped, html};
use std::collections::VecDeque;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breadcrumb {
    items: VecDeque<BreadcrumbItem>,
}

impl Breadcrumb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: BreadcrumbItem, position: Position) {
        match position {
            Position::First => self.items.push_front(item),
            Position::Last => self.items.push_back(item),
        }
    }

    /// Remove and return the item at `position`; `None` when empty.
    pub fn remove(&mut self, position: Position) -> Option<BreadcrumbItem> {
        match position {
            Position::First => self.items.pop_front(),
            Position::Last => self.items.pop_back(),
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &BreadcrumbItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Render with the configured wrapper markup.
    ///
    /// Labels and hrefs are escaped; the wrapper tags and separator are
    /// emitted verbatim.
    pub fn render(&self, config: &BreadcrumbConfig) -> Markup {
        let items: Vec<String> = self
            .items
            .iter()
            .map(|item| {
                let inner = match &item.href {
                    Some(href) => html! { a href=(href) { (item.label) } },
                    None => html! { (item.label) },
                };
                format!(
                    "{}{}{}",
                    config.item_opening_tag,
                    inner.into_string(),
                    config.item_closing_tag
                )
            })
            .collect();

        html! {
            (PreEscaped(&config.opening_tag))
            (PreEscaped(items.join(&config.item_separator)))
            (PreEscaped(&config.closing_tag))
        }
    }
}
