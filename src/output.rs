//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Templates
//! 001 blog
//!     Chain: blog → main_template
//!     Blocks: menu, sidebar
//! 002 footer_partial
//!     Chain: footer_partial
//!     Blocks: footer_links
//! 003 broken
//!     Error: unknown template: ghost
//!
//! Config
//!     Strict: off
//!     CSS tags: base, print
//!     Basic assets: 2 css, 1 js
//! ```
//!
//! ## Render
//!
//! ```text
//! blog → main_template → page.html (2048 bytes)
//!     Section main: 312 bytes
//!     css 001 /web/css/app.css
//!     css 002 inline (18 bytes) [print]
//!     js  001 computed analytics(UA-1)
//! ```
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::asset::AssetEntry;
use crate::config::LayoutConfig;
use crate::layout::Layout;
use crate::template::TemplateCheck;
use crate::types::{AssetKind, Tags};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn join_or_none<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let joined: Vec<&str> = items.into_iter().collect();
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined.join(", ")
    }
}

fn format_tags(tags: &Tags) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        let list: Vec<&str> = tags.iter().map(String::as_str).collect();
        format!(" [{}]", list.join(", "))
    }
}

/// One-line description of an asset entry.
///
/// ```text
/// /web/css/app.css
/// inline (18 bytes) [print]
/// computed theme(dark, wide)
/// ```
fn asset_line(entry: &AssetEntry) -> String {
    let body = match entry {
        AssetEntry::Uri { href, .. } => href.clone(),
        AssetEntry::Inline { content, .. } => format!("inline ({} bytes)", content.len()),
        AssetEntry::Computed { callback, args, .. } => {
            format!("computed {}({})", callback, args.join(", "))
        }
    };
    format!("{}{}", body, format_tags(entry.tags()))
}

// ============================================================================
// Check output
// ============================================================================

/// Format the result of validating a site.
pub fn format_check_output(checks: &[TemplateCheck], config: &LayoutConfig) -> Vec<String> {
    let mut lines = vec!["Templates".to_string()];
    for (i, check) in checks.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), check.name));
        match &check.chain {
            Ok(chain) => {
                lines.push(format!("{}Chain: {}", indent(1), chain.join(" → ")));
                lines.push(format!(
                    "{}Blocks: {}",
                    indent(1),
                    join_or_none(check.blocks.iter().map(String::as_str))
                ));
            }
            Err(e) => lines.push(format!("{}Error: {}", indent(1), e)),
        }
    }
    if checks.is_empty() {
        lines.push(format!("{}(no templates)", indent(1)));
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    lines.push(format!(
        "{}Default template: {}",
        indent(1),
        config.default_template
    ));
    lines.push(format!(
        "{}Strict: {}",
        indent(1),
        if config.strict { "on" } else { "off" }
    ));
    lines.push(format!(
        "{}CSS tags: {}",
        indent(1),
        join_or_none(config.css_tags.iter().map(String::as_str))
    ));
    lines.push(format!(
        "{}JS tags: {}",
        indent(1),
        join_or_none(config.js_tags.iter().map(String::as_str))
    ));
    lines.push(format!(
        "{}Basic assets: {} css, {} js",
        indent(1),
        config.basic_css.len(),
        config.basic_js.len()
    ));
    lines
}

pub fn print_check_output(checks: &[TemplateCheck], config: &LayoutConfig) {
    for line in format_check_output(checks, config) {
        println!("{}", line);
    }
}

// ============================================================================
// Render output
// ============================================================================

/// Format a summary of a rendered page: chain, destination, sections, assets.
pub fn format_render_summary(
    layout: &Layout<'_>,
    chain: &[String],
    output: &Path,
    bytes: usize,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} → {} ({} bytes)",
        chain.join(" → "),
        output.display(),
        bytes
    )];
    for (name, markup) in layout.sections().iter() {
        lines.push(format!(
            "{}Section {}: {} bytes",
            indent(1),
            name,
            markup.len()
        ));
    }
    for kind in [AssetKind::Css, AssetKind::Js] {
        for (i, entry) in layout.assets(kind).entries().enumerate() {
            lines.push(format!(
                "{}{:<3} {} {}",
                indent(1),
                kind.extension(),
                format_index(i + 1),
                asset_line(entry)
            ));
        }
    }
    lines
}

pub fn print_render_summary(layout: &Layout<'_>, chain: &[String], output: &Path, bytes: usize) {
    for line in format_render_summary(layout, chain, output, bytes) {
        println!("{}", line);
    }
}
