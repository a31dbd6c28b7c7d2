//! View rendering seam.
//!
//! The layout never interprets views itself: it hands a view id and the page
//! data to a [`ViewRenderer`] and appends whatever markup comes back to a
//! content section. [`FileViewRenderer`] is the implementation used by
//! [`Site::open`](crate::layout::Site::open):
//!
//! | File | Rendering |
//! |------|-----------|
//! | `views/<id>.html` | rendered with [MiniJinja](https://docs.rs/minijinja) |
//! | `views/<id>.md` | rendered with MiniJinja, then Markdown → HTML |
//!
//! Expressions see the page data as their context (`{{ user.name }}`,
//! `{% for tag in tags %}`). Output is HTML-escaped; undefined lookups and
//! `null` render as nothing.

use crate::naming;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value as JinjaValue};
use pulldown_cmark::{Parser, html as md_html};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Data handed to views: a JSON object.
pub type PageData = serde_json::Map<String, Value>;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("invalid view name: {0}")]
    InvalidIdentifier(String),
    #[error("view not found: {view} (looked in {})", .dir.display())]
    NotFound { view: String, dir: PathBuf },
    #[error("view {view}: {source}")]
    Render {
        view: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a view id plus page data into markup.
///
/// Closures with the matching signature implement it, which keeps tests free
/// of fixture files.
pub trait ViewRenderer {
    fn render(&self, view: &str, data: &PageData) -> Result<String, ViewError>;
}

impl<F> ViewRenderer for F
where
    F: Fn(&str, &PageData) -> Result<String, ViewError>,
{
    fn render(&self, view: &str, data: &PageData) -> Result<String, ViewError> {
        self(view, data)
    }
}

/// Renders views stored under a directory.
#[derive(Debug, Clone)]
pub struct FileViewRenderer {
    dir: PathBuf,
    env: Environment<'static>,
}

impl FileViewRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_keep_trailing_newline(true);
        env.set_formatter(|out, state, value: &JinjaValue| {
            if value.is_none() {
                Ok(())
            } else {
                minijinja::escape_formatter(out, state, value)
            }
        });
        Self {
            dir: dir.into(),
            env,
        }
    }

    fn render_file(&self, view: &str, path: &Path, data: &PageData) -> Result<String, ViewError> {
        let source = fs::read_to_string(path)?;
        self.env
            .render_named_str(&path.to_string_lossy(), &source, data)
            .map_err(|source| ViewError::Render {
                view: view.to_string(),
                source,
            })
    }
}

impl ViewRenderer for FileViewRenderer {
    fn render(&self, view: &str, data: &PageData) -> Result<String, ViewError> {
        if !naming::is_relative_path(view) {
            return Err(ViewError::InvalidIdentifier(view.to_string()));
        }
        let html_path = naming::join_relative(&self.dir, &format!("{view}.html"));
        if html_path.is_file() {
            return self.render_file(view, &html_path, data);
        }

        let md_path = naming::join_relative(&self.dir, &format!("{view}.md"));
        if md_path.is_file() {
            let text = self.render_file(view, &md_path, data)?;
            let mut out = String::new();
            md_html::push_html(&mut out, Parser::new(&text));
            return Ok(out);
        }

        Err(ViewError::NotFound {
            view: view.to_string(),
            dir: self.dir.clone(),
        })
    }
}
