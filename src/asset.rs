//! Page asset registry: stylesheets and scripts.
//!
//! Each [`Layout`](crate::layout::Layout) owns one [`AssetRegistry`] per
//! [`AssetKind`]. Entries are appended in registration order and never
//! removed during a render; templates emit them through trigger points that
//! select entries by tag.
//!
//! ## Asset Variants
//!
//! | Variant | Body | Emitted as |
//! |---------|------|------------|
//! | [`AssetEntry::Uri`] | absolute href | `<link …/>` / `<script src=…></script>` |
//! | [`AssetEntry::Inline`] | literal text | `<style>…</style>` / `<script>…</script>` |
//! | [`AssetEntry::Computed`] | [`TextProducer`] output | same as inline |
//!
//! ## Strict Mode
//!
//! When the site runs in strict mode every trigger *consumes* what it emits:
//! an entry is printed at most once, and the layout fails the render if an
//! entry was never triggered or if two uri entries share an href. Lenient mode
//! emits every matching entry on every trigger, so an asset can appear both in
//! the head and again in a footer block.

use crate::naming;
use crate::types::{AssetKind, AttrValue, Attributes, Location, Tags};
use maud::{Markup, PreEscaped, html};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("empty href for {kind} asset")]
    EmptyHref { kind: AssetKind },
    #[error("invalid href for local {kind} asset: {href}")]
    InvalidHref { kind: AssetKind, href: String },
    #[error("unknown {kind} tag(s): {}", .tags.join(", "))]
    InvalidTag { kind: AssetKind, tags: Vec<String> },
    #[error("{kind} asset not found: {}", .path.display())]
    MissingAsset { kind: AssetKind, path: PathBuf },
    #[error("invalid inline {kind} content: {reason}")]
    InvalidContent { kind: AssetKind, reason: String },
    #[error("no text producer registered as '{callback}' for computed {kind} asset")]
    InvalidCallback { kind: AssetKind, callback: String },
}

impl AssetError {
    /// `MissingAsset` is the one recoverable asset error; callers doing
    /// best-effort registration skip it and propagate everything else.
    pub fn is_missing(&self) -> bool {
        matches!(self, AssetError::MissingAsset { .. })
    }
}

// ============================================================================
// Text producers (computed assets)
// ============================================================================

/// Produces css/js text at emission time for [`AssetEntry::Computed`].
///
/// Any `Fn(&[String]) -> String` closure is a producer.
pub trait TextProducer {
    fn produce(&self, args: &[String]) -> String;
}

impl<F> TextProducer for F
where
    F: Fn(&[String]) -> String,
{
    fn produce(&self, args: &[String]) -> String {
        self(args)
    }
}

/// Named text producers available to computed assets.
#[derive(Default)]
pub struct ProducerRegistry {
    producers: HashMap<String, Box<dyn TextProducer>>,
}

impl ProducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a producer under `name`.
    pub fn register(&mut self, name: impl Into<String>, producer: impl TextProducer + 'static) {
        self.producers.insert(name.into(), Box::new(producer));
    }

    pub fn get(&self, name: &str) -> Option<&dyn TextProducer> {
        self.producers.get(name).map(|p| p.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.producers.contains_key(name)
    }
}

impl fmt::Debug for ProducerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.producers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ProducerRegistry")
            .field("producers", &names)
            .finish()
    }
}

// ============================================================================
// Entries and filters
// ============================================================================

/// One registered stylesheet or script.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetEntry {
    Uri {
        href: String,
        attributes: Attributes,
        tags: Tags,
    },
    Inline {
        content: String,
        attributes: Attributes,
        tags: Tags,
    },
    Computed {
        callback: String,
        args: Vec<String>,
        attributes: Attributes,
        tags: Tags,
    },
}

impl AssetEntry {
    pub fn tags(&self) -> &Tags {
        match self {
            AssetEntry::Uri { tags, .. }
            | AssetEntry::Inline { tags, .. }
            | AssetEntry::Computed { tags, .. } => tags,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            AssetEntry::Uri { attributes, .. }
            | AssetEntry::Inline { attributes, .. }
            | AssetEntry::Computed { attributes, .. } => attributes,
        }
    }

    /// The resolved href, for uri entries.
    pub fn href(&self) -> Option<&str> {
        match self {
            AssetEntry::Uri { href, .. } => Some(href),
            _ => None,
        }
    }
}

/// Tag selection applied by triggers and basic-asset loading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagFilter {
    /// Everything.
    #[default]
    All,
    /// Entries sharing at least one tag with the set.
    Any(Tags),
    /// Entries sharing no tag with the set.
    Except(Tags),
}

impl TagFilter {
    pub fn matches(&self, tags: &Tags) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Any(filter) => !tags.is_disjoint(filter),
            TagFilter::Except(filter) => tags.is_disjoint(filter),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Filesystem and config context a registry validates against.
#[derive(Debug, Clone)]
pub struct AssetSettings {
    /// Absolute path of the site's web folder.
    pub web_dir: PathBuf,
    /// `base_url + web_folder + "/"`.
    pub href_prefix: String,
    pub known_tags: Tags,
}

#[derive(Debug)]
struct Slot {
    entry: AssetEntry,
    triggered: bool,
}

/// Ordered assets of one kind.
#[derive(Debug)]
pub struct AssetRegistry {
    kind: AssetKind,
    settings: AssetSettings,
    slots: Vec<Slot>,
}

impl AssetRegistry {
    pub fn new(kind: AssetKind, settings: AssetSettings) -> Self {
        Self {
            kind,
            settings,
            slots: Vec::new(),
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &AssetEntry> {
        self.slots.iter().map(|s| &s.entry)
    }

    /// Href for a relative path: local paths are prefixed, remote ones kept.
    pub fn absolute_href(&self, path: &str, location: Location) -> String {
        match location {
            Location::Local => format!("{}{}", self.settings.href_prefix, path),
            Location::Remote => path.to_string(),
        }
    }

    fn check_tags(&self, tags: &Tags) -> Result<(), AssetError> {
        let unknown: Vec<String> = tags
            .difference(&self.settings.known_tags)
            .cloned()
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(AssetError::InvalidTag {
                kind: self.kind,
                tags: unknown,
            })
        }
    }

    fn push(&mut self, entry: AssetEntry) {
        tracing::debug!(kind = %self.kind, index = self.slots.len(), "registered asset");
        self.slots.push(Slot {
            entry,
            triggered: false,
        });
    }

    /// Register a file or URL asset.
    ///
    /// Local assets must exist under the web folder; a miss is reported as
    /// [`AssetError::MissingAsset`] and nothing is registered.
    pub fn add_uri(
        &mut self,
        path: &str,
        location: Location,
        attributes: Attributes,
        tags: Tags,
    ) -> Result<(), AssetError> {
        if path.is_empty() {
            return Err(AssetError::EmptyHref { kind: self.kind });
        }
        self.check_tags(&tags)?;
        if location == Location::Local {
            if !naming::is_relative_path(path) {
                return Err(AssetError::InvalidHref {
                    kind: self.kind,
                    href: path.to_string(),
                });
            }
            let file = naming::join_relative(&self.settings.web_dir, path);
            if !file.is_file() {
                return Err(AssetError::MissingAsset {
                    kind: self.kind,
                    path: file,
                });
            }
        }
        let href = self.absolute_href(path, location);
        self.push(AssetEntry::Uri {
            href,
            attributes,
            tags,
        });
        Ok(())
    }

    /// Register literal css/js text.
    pub fn add_inline(
        &mut self,
        content: impl Into<String>,
        attributes: Attributes,
        tags: Tags,
    ) -> Result<(), AssetError> {
        self.check_tags(&tags)?;
        let content = content.into();
        if content.trim().is_empty() {
            return Err(AssetError::InvalidContent {
                kind: self.kind,
                reason: "content is empty".into(),
            });
        }
        let closing = closing_tag_prefix(self.kind);
        if content.to_ascii_lowercase().contains(closing) {
            return Err(AssetError::InvalidContent {
                kind: self.kind,
                reason: format!("content must not contain '{closing}'"),
            });
        }
        self.push(AssetEntry::Inline {
            content,
            attributes,
            tags,
        });
        Ok(())
    }

    /// Register an asset whose body is produced at emission time.
    pub fn add_computed(
        &mut self,
        callback: &str,
        args: Vec<String>,
        attributes: Attributes,
        tags: Tags,
        producers: &ProducerRegistry,
    ) -> Result<(), AssetError> {
        self.check_tags(&tags)?;
        if !producers.contains(callback) {
            return Err(AssetError::InvalidCallback {
                kind: self.kind,
                callback: callback.to_string(),
            });
        }
        self.push(AssetEntry::Computed {
            callback: callback.to_string(),
            args,
            attributes,
            tags,
        });
        Ok(())
    }

    /// Entries whose tags intersect `filter`, or all entries for `None`.
    pub fn select_by_tags(&self, filter: Option<&Tags>) -> Vec<&AssetEntry> {
        match filter {
            None => self.entries().collect(),
            Some(tags) => self
                .entries()
                .filter(|e| !e.tags().is_disjoint(tags))
                .collect(),
        }
    }

    /// Entries whose tags do not intersect `filter`.
    pub fn select_excluding_tags(&self, filter: &Tags) -> Vec<&AssetEntry> {
        self.entries()
            .filter(|e| e.tags().is_disjoint(filter))
            .collect()
    }

    /// Render one entry.
    pub fn emit(
        &self,
        entry: &AssetEntry,
        producers: &ProducerRegistry,
    ) -> Result<Markup, AssetError> {
        let mut out = String::new();
        match (self.kind, entry) {
            (AssetKind::Css, AssetEntry::Uri { href, attributes, .. }) => {
                out.push_str(r#"<link rel="stylesheet" type="text/css" href=""#);
                out.push_str(&escape(href));
                out.push('"');
                push_attributes(&mut out, attributes);
                out.push_str(" />");
            }
            (AssetKind::Js, AssetEntry::Uri { href, attributes, .. }) => {
                out.push_str(r#"<script type="text/javascript" src=""#);
                out.push_str(&escape(href));
                out.push('"');
                push_attributes(&mut out, attributes);
                out.push_str("></script>");
            }
            (kind, AssetEntry::Inline { content, attributes, .. }) => {
                push_body_element(&mut out, kind, attributes, content);
            }
            (kind, AssetEntry::Computed { callback, args, attributes, .. }) => {
                let producer = producers
                    .get(callback)
                    .ok_or_else(|| AssetError::InvalidCallback {
                        kind,
                        callback: callback.clone(),
                    })?;
                let body = producer.produce(args);
                push_body_element(&mut out, kind, attributes, &body);
            }
        }
        Ok(PreEscaped(out))
    }

    /// Emit every entry matching `filter`, in registration order.
    ///
    /// With `consume` set, already-triggered entries are skipped and emitted
    /// ones are marked, so each entry is printed at most once.
    pub fn trigger(
        &mut self,
        filter: &TagFilter,
        consume: bool,
        producers: &ProducerRegistry,
    ) -> Result<Markup, AssetError> {
        let mut out = String::new();
        let mut emitted = Vec::new();
        for (idx, slot) in self.slots.iter().enumerate() {
            if consume && slot.triggered {
                continue;
            }
            if !filter.matches(slot.entry.tags()) {
                continue;
            }
            out.push_str(&self.emit(&slot.entry, producers)?.into_string());
            emitted.push(idx);
        }
        if consume {
            for idx in &emitted {
                self.slots[*idx].triggered = true;
            }
        }
        tracing::debug!(kind = %self.kind, count = emitted.len(), "triggered assets");
        Ok(PreEscaped(out))
    }

    /// Entries no trigger has consumed yet.
    pub fn untriggered(&self) -> Vec<&AssetEntry> {
        self.slots
            .iter()
            .filter(|s| !s.triggered)
            .map(|s| &s.entry)
            .collect()
    }

    /// Hrefs shared by more than one uri entry, in first-seen order.
    pub fn duplicate_hrefs(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut dupes: Vec<&str> = Vec::new();
        for href in self.entries().filter_map(AssetEntry::href) {
            if !seen.insert(href) && !dupes.contains(&href) {
                dupes.push(href);
            }
        }
        dupes
    }
}

fn closing_tag_prefix(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Css => "</style",
        AssetKind::Js => "</script",
    }
}

fn push_body_element(out: &mut String, kind: AssetKind, attributes: &Attributes, body: &str) {
    let (open, close) = match kind {
        AssetKind::Css => (r#"<style type="text/css""#, "</style>"),
        AssetKind::Js => (r#"<script type="text/javascript""#, "</script>"),
    };
    out.push_str(open);
    push_attributes(out, attributes);
    out.push('>');
    out.push_str(body);
    out.push_str(close);
}

/// Append ` name="value"` pairs; `false` flags are dropped, `true` flags are bare.
fn push_attributes(out: &mut String, attributes: &Attributes) {
    for (name, value) in attributes {
        match value {
            AttrValue::Flag(false) => {}
            AttrValue::Flag(true) => {
                out.push(' ');
                out.push_str(&escape(name));
            }
            AttrValue::Text(text) => {
                out.push(' ');
                out.push_str(&escape(name));
                out.push_str("=\"");
                out.push_str(&escape(text));
                out.push('"');
            }
        }
    }
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{attributes, tags};
    use std::fs;
    use tempfile::TempDir;

    fn settings(web_dir: &std::path::Path, known: &[&str]) -> AssetSettings {
        AssetSettings {
            web_dir: web_dir.to_path_buf(),
            href_prefix: "http://example.com/web/".into(),
            known_tags: tags(known.iter().copied()),
        }
    }

    fn web_with(files: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for file in files {
            let path = naming::join_relative(tmp.path(), file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "/* asset */").unwrap();
        }
        tmp
    }

    fn registry_with_tagged(entries: &[(&str, &[&str])]) -> AssetRegistry {
        let mut reg = AssetRegistry::new(
            AssetKind::Css,
            settings(std::path::Path::new("/nonexistent"), &["a", "b", "c"]),
        );
        for (href, t) in entries {
            reg.add_uri(
                href,
                Location::Remote,
                Attributes::new(),
                tags(t.iter().copied()),
            )
                .unwrap();
        }
        reg
    }

    fn hrefs<'a>(entries: &[&'a AssetEntry]) -> Vec<&'a str> {
        entries.iter().filter_map(|e| e.href()).collect()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    #[test]
    fn local_uri_href_is_prefixed() {
        let web = web_with(&["css/app.css"]);
        let mut reg = AssetRegistry::new(AssetKind::Css, settings(web.path(), &[]));
        reg.add_uri(
            "css/app.css",
            Location::Local,
            Attributes::new(),
            Tags::new(),
        )
            .unwrap();
        let entry = reg.entries().next().unwrap();
        assert_eq!(entry.href(), Some("http://example.com/web/css/app.css"));
    }

    #[test]
    fn remote_uri_href_is_verbatim() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Js, settings(web.path(), &[]));
        reg.add_uri(
            "https://cdn.example.com/lib.js",
            Location::Remote,
            Attributes::new(),
            Tags::new(),
        )
        .unwrap();
        assert_eq!(
            reg.entries().next().unwrap().href(),
            Some("https://cdn.example.com/lib.js")
        );
    }

    #[test]
    fn missing_local_file_is_soft_error() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Css, settings(web.path(), &[]));
        let err = reg
            .add_uri(
                "css/nope.css",
                Location::Local,
                Attributes::new(),
                Tags::new(),
            )
            .unwrap_err();
        assert!(err.is_missing());
        assert!(reg.is_empty());
    }

    #[test]
    fn local_path_traversal_is_rejected() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Css, settings(web.path(), &[]));
        let err = reg
            .add_uri(
                "../secret.css",
                Location::Local,
                Attributes::new(),
                Tags::new(),
            )
            .unwrap_err();
        assert!(matches!(err, AssetError::InvalidHref { .. }));
    }

    #[test]
    fn empty_href_is_rejected() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Css, settings(web.path(), &[]));
        let err = reg
            .add_uri("", Location::Remote, Attributes::new(), Tags::new())
            .unwrap_err();
        assert!(matches!(err, AssetError::EmptyHref { .. }));
    }

    #[test]
    fn unknown_tag_is_rejected_before_existence_check() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Css, settings(web.path(), &["a"]));
        let err = reg
            .add_uri(
                "css/nope.css",
                Location::Local,
                Attributes::new(),
                tags(["a", "zzz"]),
            )
            .unwrap_err();
        match err {
            AssetError::InvalidTag { tags, .. } => assert_eq!(tags, vec!["zzz".to_string()]),
            other => panic!("expected InvalidTag, got {other:?}"),
        }
    }

    #[test]
    fn inline_rejects_blank_and_breaking_content() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Js, settings(web.path(), &[]));
        assert!(matches!(
            reg.add_inline("   ", Attributes::new(), Tags::new()),
            Err(AssetError::InvalidContent { .. })
        ));
        assert!(matches!(
            reg.add_inline("alert(1)</SCRIPT><b>", Attributes::new(), Tags::new()),
            Err(AssetError::InvalidContent { .. })
        ));
        reg.add_inline("console.log('ok')", Attributes::new(), Tags::new())
            .unwrap();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn computed_requires_registered_producer() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Css, settings(web.path(), &[]));
        let mut producers = ProducerRegistry::new();
        let err = reg
            .add_computed("theme", vec![], Attributes::new(), Tags::new(), &producers)
            .unwrap_err();
        assert!(matches!(err, AssetError::InvalidCallback { .. }));

        producers.register("theme", |args: &[String]| {
            format!("body{{color:{}}}", args[0])
        });
        reg.add_computed(
            "theme",
            vec!["red".into()],
            Attributes::new(),
            Tags::new(),
            &producers,
        )
        .unwrap();
        let html = reg
            .trigger(&TagFilter::All, false, &producers)
            .unwrap()
            .into_string();
        assert_eq!(html, r#"<style type="text/css">body{color:red}</style>"#);
    }

    // =========================================================================
    // Selection
    // =========================================================================

    #[test]
    fn select_none_returns_all_in_order() {
        let reg = registry_with_tagged(&[("x1", &["a"]), ("x2", &[]), ("x3", &["b"])]);
        assert_eq!(hrefs(&reg.select_by_tags(None)), vec!["x1", "x2", "x3"]);
    }

    #[test]
    fn select_by_tags_intersects() {
        let reg = registry_with_tagged(&[
            ("x1", &["a"]),
            ("x2", &["c"]),
            ("x3", &["b", "c"]),
            ("x4", &[]),
        ]);
        let filter = tags(["a", "b"]);
        assert_eq!(hrefs(&reg.select_by_tags(Some(&filter))), vec!["x1", "x3"]);
        // Filter order is irrelevant
        let reversed = tags(["b", "a"]);
        assert_eq!(
            hrefs(&reg.select_by_tags(Some(&reversed))),
            hrefs(&reg.select_by_tags(Some(&filter)))
        );
    }

    #[test]
    fn select_and_exclude_partition_the_registry() {
        let reg = registry_with_tagged(&[
            ("x1", &["a"]),
            ("x2", &["c"]),
            ("x3", &["b", "c"]),
            ("x4", &[]),
            ("x5", &["a", "b"]),
        ]);
        for filter in [tags(["a"]), tags(["c"]), tags(["a", "c"]), Tags::new()] {
            let selected = hrefs(&reg.select_by_tags(Some(&filter)));
            let excluded = hrefs(&reg.select_excluding_tags(&filter));
            assert!(selected.iter().all(|h| !excluded.contains(h)));
            let mut union: Vec<&str> = selected.iter().chain(excluded.iter()).copied().collect();
            union.sort_unstable();
            assert_eq!(union, vec!["x1", "x2", "x3", "x4", "x5"]);
        }
    }

    // =========================================================================
    // Emission
    // =========================================================================

    #[test]
    fn emit_css_uri_with_attributes() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Css, settings(web.path(), &[]));
        reg.add_uri(
            "https://cdn.example.com/a.css",
            Location::Remote,
            attributes([
                ("media", AttrValue::from("screen")),
                ("disabled", AttrValue::from(false)),
                ("blocking", AttrValue::from(true)),
            ]),
            Tags::new(),
        )
        .unwrap();
        let entry = reg.entries().next().unwrap().clone();
        let html = reg
            .emit(&entry, &ProducerRegistry::new())
            .unwrap()
            .into_string();
        assert_eq!(
            html,
            r#"<link rel="stylesheet" type="text/css" href="https://cdn.example.com/a.css" blocking media="screen" />"#
        );
    }

    #[test]
    fn emit_js_uri_and_inline() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Js, settings(web.path(), &[]));
        reg.add_uri(
            "https://cdn.example.com/a.js",
            Location::Remote,
            attributes([("defer", true)]),
            Tags::new(),
        )
        .unwrap();
        reg.add_inline("let x = 1 < 2;", Attributes::new(), Tags::new())
            .unwrap();
        let html = reg
            .trigger(&TagFilter::All, false, &ProducerRegistry::new())
            .unwrap()
            .into_string();
        assert_eq!(
            html,
            concat!(
                r#"<script type="text/javascript" src="https://cdn.example.com/a.js" defer></script>"#,
                r#"<script type="text/javascript">let x = 1 < 2;</script>"#
            )
        );
    }

    #[test]
    fn attribute_values_are_escaped() {
        let web = web_with(&[]);
        let mut reg = AssetRegistry::new(AssetKind::Css, settings(web.path(), &[]));
        reg.add_uri(
            "a.css?x=1&y=2",
            Location::Remote,
            attributes([("title", r#"say "hi""#)]),
            Tags::new(),
        )
        .unwrap();
        let html = reg
            .trigger(&TagFilter::All, false, &ProducerRegistry::new())
            .unwrap()
            .into_string();
        assert!(html.contains(r#"href="a.css?x=1&amp;y=2""#));
        assert!(html.contains(r#"title="say &quot;hi&quot;""#));
    }

    // =========================================================================
    // Triggering
    // =========================================================================

    #[test]
    fn lenient_trigger_emits_overlapping_filters_repeatedly() {
        let mut reg = registry_with_tagged(&[("x1", &["a"]), ("x2", &["a", "b"])]);
        let producers = ProducerRegistry::new();
        let first = reg
            .trigger(&TagFilter::All, false, &producers)
            .unwrap()
            .into_string();
        let second = reg
            .trigger(&TagFilter::Any(tags(["b"])), false, &producers)
            .unwrap()
            .into_string();
        assert!(first.contains("x1") && first.contains("x2"));
        assert!(second.contains("x2") && !second.contains("x1"));
        assert_eq!(reg.untriggered().len(), 2);
    }

    #[test]
    fn consuming_trigger_emits_each_entry_once() {
        let mut reg = registry_with_tagged(&[("x1", &["a"]), ("x2", &["b"]), ("x3", &[])]);
        let producers = ProducerRegistry::new();
        let head = reg
            .trigger(&TagFilter::Any(tags(["a"])), true, &producers)
            .unwrap()
            .into_string();
        let rest = reg
            .trigger(&TagFilter::All, true, &producers)
            .unwrap()
            .into_string();
        assert!(head.contains("x1"));
        assert!(!rest.contains("x1"));
        assert!(rest.contains("x2") && rest.contains("x3"));
        assert!(reg.untriggered().is_empty());
    }

    #[test]
    fn except_filter_skips_tagged_entries() {
        let mut reg = registry_with_tagged(&[("x1", &["a"]), ("x2", &["b"]), ("x3", &[])]);
        let html = reg
            .trigger(
                &TagFilter::Except(tags(["a"])),
                true,
                &ProducerRegistry::new(),
            )
            .unwrap()
            .into_string();
        assert!(!html.contains("x1"));
        assert_eq!(hrefs(&reg.untriggered()), vec!["x1"]);
    }

    #[test]
    fn duplicate_hrefs_are_reported_once() {
        let reg = registry_with_tagged(&[("x1", &[]), ("x2", &[]), ("x1", &[]), ("x1", &[])]);
        assert_eq!(reg.duplicate_hrefs(), vec!["x1"]);
    }
}
