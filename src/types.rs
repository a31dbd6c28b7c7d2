//! Shared value types used by the asset registry, breadcrumb and layout.
//!
//! These are plain data: they carry no filesystem state and can be built
//! freely by callers, config deserialization and tests alike.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Which asset registry an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Css,
    Js,
}

impl AssetKind {
    /// File extension and top-level web folder for this kind (`css`, `js`).
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Js => "js",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Css => f.write_str("css"),
            AssetKind::Js => f.write_str("javascript"),
        }
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "css" => Ok(AssetKind::Css),
            "js" => Ok(AssetKind::Js),
            other => Err(format!("unknown asset kind '{other}' (expected css or js)")),
        }
    }
}

/// Where a URI asset lives.
///
/// - `Local`: relative to the site's web folder; existence is checked and the
///   href is rewritten against the base URL.
/// - `Remote`: used verbatim (CDN links and the like).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[default]
    Local,
    Remote,
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Location::Local),
            "remote" => Ok(Location::Remote),
            other => Err(format!(
                "unknown asset location '{other}' (expected local or remote)"
            )),
        }
    }
}

/// An HTML attribute value.
///
/// `Flag(false)` is omitted on emission, `Flag(true)` renders as a bare
/// attribute name (`async`, `defer`), `Text` renders as `name="value"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Text(String),
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

pub type Attributes = BTreeMap<String, AttrValue>;
pub type Tags = BTreeSet<String>;

/// Build a tag set from anything string-like.
pub fn tags<I, S>(items: I) -> Tags
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// Build an attribute map from `(name, value)` pairs.
pub fn attributes<I, K, V>(items: I) -> Attributes
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttrValue>,
{
    items
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Which end of the breadcrumb an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    First,
    #[default]
    Last,
}

/// One breadcrumb entry. `href = None` renders as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadcrumbItem {
    pub label: String,
    pub href: Option<String>,
}

impl BreadcrumbItem {
    pub fn new(label: impl Into<String>, href: Option<String>) -> Self {
        Self {
            label: label.into(),
            href,
        }
    }
}

/// Active request route, supplied by the request-handling layer.
///
/// `directory` is the optional controller sub-directory (`"admin/"`), empty
/// for top-level controllers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteInfo {
    pub controller: String,
    pub directory: String,
    pub action: String,
}

impl RouteInfo {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            directory: String::new(),
            action: action.into(),
        }
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }
}
