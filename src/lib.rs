//! # Simple Layout
//!
//! Server-side page composition: nested templates with overridable blocks,
//! named content sections filled by views, and a tag-aware registry of
//! stylesheets and scripts emitted at trigger points in the page shell.
//!
//! # Architecture: Shared Site, Per-Request Layout
//!
//! ```text
//! Site::open(root)          layout.toml + templates/ + views/   (read-only, shared)
//!   └── site.layout(route)  one Layout per request               (all mutable state)
//!         ├── set_title / set_metadata / add_breadcrumb_item …
//!         ├── add_css / add_inline / add_basic_assets …
//!         └── render_view("welcome", data)  →  String
//! ```
//!
//! Nothing is global. A `Layout` borrows its `Site`, owns its assets,
//! sections and template chains, and is dropped once the page is rendered,
//! so two requests can never see each other's state.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`layout`] | `Site` and `Layout`: setters, views, triggers, the render pass |
//! | [`template`] | Template store on disk and the chain stack with block lookup |
//! | [`directive`] | Parser for `{% … %}` directives in entry and block files |
//! | [`asset`] | Uri / inline / computed assets, tag filters, strict bookkeeping |
//! | [`sections`] | Named content buffers that views render into |
//! | [`breadcrumb`] | Navigation trail with insertion and removal at both ends |
//! | [`view`] | `ViewRenderer` seam and the file-backed HTML/Markdown renderer |
//! | [`config`] | `layout.toml` loading, merging onto stock defaults, validation |
//! | [`naming`] | Identifier checks and conventional controller/action paths |
//! | [`types`] | Shared value types (`AssetKind`, `Tags`, `RouteInfo`, …) |
//! | [`output`] | CLI output formatting for `check` and `render` |
//!
//! # Design Decisions
//!
//! ## Directives Instead of Executable Templates
//!
//! Template files are plain HTML with a handful of `{% … %}` directives. They
//! cannot run code; every directive maps to exactly one method on
//! [`layout::Layout`]. The set is small enough to validate up front, and a
//! typo fails the render with the file name and line instead of silently
//! printing nothing.
//!
//! ## Maud for Generated Markup
//!
//! Everything the crate itself generates (title, meta tags, breadcrumb items,
//! asset attributes) goes through [Maud](https://maud.lambda.xyz/) escaping.
//! Template files, view output and configured breadcrumb wrappers are markup
//! already and are passed through unchanged.
//!
//! ## Strict Mode Is Opt-In
//!
//! With `strict = true` each asset is printed by exactly one trigger, and a
//! render fails if an asset was never printed, if two uri assets share an
//! href, or if a template prints a section nobody filled. Lenient mode (the
//! default) prints every matching asset at every trigger and treats unknown
//! sections as empty, which is friendlier while a site is being built.
//!
//! ## Cycles Are Errors
//!
//! A template whose parent chain loops back on itself fails with
//! [`template::TemplateError::CyclicTemplate`]. Includes and blocks share one
//! nesting counter, so a template that keeps including itself, or a block that
//! names itself, stops at [`layout::MAX_INCLUDE_DEPTH`].

pub mod asset;
pub mod breadcrumb;
pub mod config;
pub mod directive;
pub mod layout;
pub mod naming;
pub mod output;
pub mod sections;
pub mod template;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod test_helpers;
