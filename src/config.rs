//! Layout configuration module.
//!
//! Handles loading, validating, and merging `layout.toml`. Stock defaults are
//! overridden by the user file at the site root; the result is read-only for
//! the lifetime of the [`Site`](crate::layout::Site).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! web_folder = "web"                 # Folder holding local css/js assets
//! base_url = "/"                     # Prefix for local asset hrefs
//! default_template = "main_template" # Template used unless set per request
//! default_title = "Untitled"
//! default_charset = "UTF-8"
//! default_content_section = "main"   # Section views are rendered into
//! strict = false                     # Once-only emission + duplicate checks
//!
//! css_tags = []                      # Tags css assets may carry
//! js_tags = []                       # Tags js assets may carry
//!
//! [[basic_css]]                      # Assets added by add_basic_assets()
//! href = "css/reset.css"
//! location = "local"
//! tags = ["base"]
//!
//! [breadcrumb]
//! opening_tag = '<div id="breadcrumb">'
//! closing_tag = "</div>"
//! item_opening_tag = "<span>"
//! item_closing_tag = "</span>"
//! item_separator = " &gt; "
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::{AssetKind, Attributes, Location, Tags};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the site-level config file.
pub const CONFIG_FILE: &str = "layout.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Layout configuration loaded from `layout.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Folder (under the site root) holding local assets.
    pub web_folder: String,
    /// Prefix prepended to `web_folder` for local asset hrefs.
    pub base_url: String,
    pub default_template: String,
    pub default_title: String,
    pub default_charset: String,
    /// Content section that views are rendered into by `render_view`.
    pub default_content_section: String,
    /// Enables once-only asset emission and the duplicate/unconsumed checks.
    pub strict: bool,
    /// Tags css assets may carry.
    pub css_tags: Tags,
    /// Tags js assets may carry.
    pub js_tags: Tags,
    /// Stylesheets registered by `add_basic_assets`.
    pub basic_css: Vec<AssetSpec>,
    /// Scripts registered by `add_basic_assets`.
    pub basic_js: Vec<AssetSpec>,
    /// Wrapper markup for the breadcrumb trigger.
    pub breadcrumb: BreadcrumbConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            web_folder: "web".to_string(),
            base_url: "/".to_string(),
            default_template: "main_template".to_string(),
            default_title: "Untitled".to_string(),
            default_charset: "UTF-8".to_string(),
            default_content_section: "main".to_string(),
            strict: false,
            css_tags: Tags::new(),
            js_tags: Tags::new(),
            basic_css: Vec::new(),
            basic_js: Vec::new(),
            breadcrumb: BreadcrumbConfig::default(),
        }
    }
}

impl LayoutConfig {
    /// Validate values that serde alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.web_folder.trim().is_empty() {
            return Err(ConfigError::Validation(
                "web_folder must not be empty".into(),
            ));
        }
        if self.default_template.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_template must not be empty".into(),
            ));
        }
        if self.default_content_section.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_content_section must not be empty".into(),
            ));
        }
        for kind in [AssetKind::Css, AssetKind::Js] {
            let known = self.known_tags(kind);
            for spec in self.basic_assets(kind) {
                if spec.href.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "basic_{} entries must have an href",
                        kind.extension()
                    )));
                }
                if let Some(tag) = spec.tags.iter().find(|t| !known.contains(*t)) {
                    return Err(ConfigError::Validation(format!(
                        "basic_{} asset {} uses unknown tag '{}'",
                        kind.extension(),
                        spec.href,
                        tag
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn known_tags(&self, kind: AssetKind) -> &Tags {
        match kind {
            AssetKind::Css => &self.css_tags,
            AssetKind::Js => &self.js_tags,
        }
    }

    pub fn basic_assets(&self, kind: AssetKind) -> &[AssetSpec] {
        match kind {
            AssetKind::Css => &self.basic_css,
            AssetKind::Js => &self.basic_js,
        }
    }

    /// Prefix for local asset hrefs: `base_url + web_folder + "/"`.
    pub fn local_href_prefix(&self) -> String {
        format!("{}{}/", self.base_url, self.web_folder)
    }
}

/// A URI asset declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetSpec {
    pub href: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl AssetSpec {
    /// Local asset with no attributes and no tags.
    pub fn local(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            location: Location::Local,
            attributes: Attributes::new(),
            tags: Tags::new(),
        }
    }
}

/// Markup wrapped around the breadcrumb and each of its items.
///
/// Values are emitted verbatim, so they may contain HTML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreadcrumbConfig {
    pub opening_tag: String,
    pub closing_tag: String,
    pub item_opening_tag: String,
    pub item_closing_tag: String,
    pub item_separator: String,
}

impl Default for BreadcrumbConfig {
    fn default() -> Self {
        Self {
            opening_tag: r#"<div id="breadcrumb">"#.to_string(),
            closing_tag: "</div>".to_string(),
            item_opening_tag: "<span>".to_string(),
            item_closing_tag: "</span>".to_string(),
            item_separator: " &gt; ".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LayoutConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so arrays such
///   as `css_tags` or `basic_css` are replaced, never concatenated.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `layout.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LayoutConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LayoutConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `layout.toml` in the given site root.
pub fn load_config(root: &Path) -> Result<LayoutConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `layout.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Layout Configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Folder (relative to the site root) holding local css/js assets.
web_folder = "web"

# Prefix for local asset hrefs. A local asset "css/app.css" is emitted as
# base_url + web_folder + "/css/app.css".
base_url = "/"

# Template used for every page unless a request picks another one.
default_template = "main_template"

default_title = "Untitled"
default_charset = "UTF-8"

# Content section that rendered views are appended to.
default_content_section = "main"

# Strict mode: every registered asset must be emitted exactly once, and two
# uri assets may not resolve to the same href.
strict = false

# Tags that assets may carry. Adding an asset with any other tag is an error.
css_tags = []
js_tags = []

# Basic assets, registered by add_basic_assets(). Example:
#
# [[basic_css]]
# href = "css/reset.css"
# location = "local"          # or "remote"
# tags = ["base"]
#
# [[basic_js]]
# href = "https://cdn.example.com/lib.js"
# location = "remote"
# attributes = { defer = true, crossorigin = "anonymous" }
basic_css = []
basic_js = []

# ---------------------------------------------------------------------------
# Breadcrumb markup (emitted verbatim)
# ---------------------------------------------------------------------------
[breadcrumb]
opening_tag = '<div id="breadcrumb">'
closing_tag = "</div>"
item_opening_tag = "<span>"
item_closing_tag = "</span>"
item_separator = " &gt; "
"##
}
