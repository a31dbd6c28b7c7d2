//! Page composition: the shared [`Site`] and the per-request [`Layout`].
//!
//! A `Site` is opened once and holds everything read-only: configuration, the
//! template store, the view renderer and the named text producers. Every
//! request gets its own `Layout` from [`Site::layout`], which owns the mutable
//! page state (title, metadata, assets, content sections, breadcrumb, template
//! chains) and is dropped when the page has been rendered.
//!
//! ## Render Flow
//!
//! ```text
//! render_view("welcome", data)
//!   ├── view "welcome" rendered into section "main"
//!   └── render()
//!         ├── template exists?              else UnknownTemplate
//!         ├── strict: duplicate hrefs?      → DuplicateAsset
//!         ├── push chain [blog, main_template]
//!         ├── main_template/layout.html     directives call back into Layout
//!         │     {% css %} {% block menu %} {% include footer_partial %} …
//!         ├── pop chain
//!         └── strict: untriggered assets?   → UnconsumedAssets
//! ```
//!
//! In strict mode every asset trigger consumes what it prints, so a template
//! can emit `{% css print %}` in one spot and `{% css %}` for the rest.

use crate::asset::{
    AssetError, AssetRegistry, AssetSettings, ProducerRegistry, TagFilter, TextProducer,
};
use crate::breadcrumb::Breadcrumb;
use crate::config::{self, AssetSpec, ConfigError, LayoutConfig};
use crate::directive::{self, Directive, DirectiveError, Node};
use crate::naming;
use crate::sections::ContentSections;
use crate::template::{TemplateChains, TemplateError, TemplateStore};
use crate::types::{
    AssetKind, Attributes, BreadcrumbItem, Location, Position, RouteInfo, Tags,
};
use crate::view::{FileViewRenderer, PageData, ViewError, ViewRenderer};
use maud::{Markup, PreEscaped, html};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TEMPLATES_DIR: &str = "templates";
pub const VIEWS_DIR: &str = "views";

/// Nesting limit for `{% include %}` and `{% block %}`; a template including
/// itself or a block naming itself would otherwise recurse until the stack
/// overflows.
pub const MAX_INCLUDE_DEPTH: usize = 32;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("View error: {0}")]
    View(#[from] ViewError),
    #[error("{}: {source}", .path.display())]
    Directive {
        path: PathBuf,
        #[source]
        source: DirectiveError,
    },
    #[error("unknown content section: {0}")]
    UnknownContentSection(String),
    #[error("{kind} asset added more than once: {href}")]
    DuplicateAsset { kind: AssetKind, href: String },
    #[error("{count} {kind} asset(s) added but never triggered")]
    UnconsumedAssets { kind: AssetKind, count: usize },
    #[error("includes or blocks nested deeper than {} at {name}", MAX_INCLUDE_DEPTH)]
    IncludeDepth { name: String },
    #[error("page data must be a JSON object")]
    InvalidData,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert a parsed JSON document into view data.
pub fn page_data(value: Value) -> Result<PageData, LayoutError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(PageData::new()),
        _ => Err(LayoutError::InvalidData),
    }
}

// ============================================================================
// Site
// ============================================================================

/// Read-only state shared by every render.
pub struct Site {
    root: PathBuf,
    config: LayoutConfig,
    templates: TemplateStore,
    views: Box<dyn ViewRenderer>,
    producers: ProducerRegistry,
}

impl Site {
    /// Load `layout.toml` from `root` and use the file-backed view renderer.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, LayoutError> {
        let root = root.into();
        let config = config::load_config(&root)?;
        tracing::debug!(root = %root.display(), strict = config.strict, "opened site");
        Ok(Self::new(root, config))
    }

    pub fn new(root: impl Into<PathBuf>, config: LayoutConfig) -> Self {
        let root = root.into();
        Self {
            templates: TemplateStore::new(root.join(TEMPLATES_DIR)),
            views: Box::new(FileViewRenderer::new(root.join(VIEWS_DIR))),
            producers: ProducerRegistry::new(),
            config,
            root,
        }
    }

    /// Replace the view renderer.
    pub fn with_views(mut self, views: impl ViewRenderer + 'static) -> Self {
        self.views = Box::new(views);
        self
    }

    /// Register a text producer for computed assets.
    pub fn register_producer(
        &mut self,
        name: impl Into<String>,
        producer: impl TextProducer + 'static,
    ) -> &mut Self {
        self.producers.register(name, producer);
        self
    }

    /// Fresh per-request layout.
    pub fn layout(&self, route: RouteInfo) -> Layout<'_> {
        Layout::new(self, route)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn producers(&self) -> &ProducerRegistry {
        &self.producers
    }

    pub fn web_dir(&self) -> PathBuf {
        naming::join_relative(&self.root, &self.config.web_folder)
    }

    fn asset_settings(&self, kind: AssetKind) -> AssetSettings {
        AssetSettings {
            web_dir: self.web_dir(),
            href_prefix: self.config.local_href_prefix(),
            known_tags: self.config.known_tags(kind).clone(),
        }
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("templates", &self.templates)
            .field("producers", &self.producers)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Mutable page state for one request.
#[derive(Debug)]
pub struct Layout<'s> {
    site: &'s Site,
    route: RouteInfo,
    template: String,
    title: String,
    charset: String,
    metadata: BTreeMap<String, String>,
    http_equiv: BTreeMap<String, String>,
    css: AssetRegistry,
    js: AssetRegistry,
    sections: ContentSections,
    breadcrumb: Breadcrumb,
    chains: TemplateChains,
    nesting: usize,
}

impl<'s> Layout<'s> {
    fn new(site: &'s Site, route: RouteInfo) -> Self {
        let config = &site.config;
        Self {
            site,
            route,
            template: config.default_template.clone(),
            title: config.default_title.clone(),
            charset: config.default_charset.clone(),
            metadata: BTreeMap::new(),
            http_equiv: BTreeMap::new(),
            css: AssetRegistry::new(AssetKind::Css, site.asset_settings(AssetKind::Css)),
            js: AssetRegistry::new(AssetKind::Js, site.asset_settings(AssetKind::Js)),
            sections: ContentSections::new(),
            breadcrumb: Breadcrumb::new(),
            chains: TemplateChains::new(),
            nesting: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn site(&self) -> &'s Site {
        self.site
    }

    pub fn route(&self) -> &RouteInfo {
        &self.route
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn http_equiv(&self) -> &BTreeMap<String, String> {
        &self.http_equiv
    }

    pub fn breadcrumb(&self) -> &Breadcrumb {
        &self.breadcrumb
    }

    pub fn sections(&self) -> &ContentSections {
        &self.sections
    }

    pub fn assets(&self, kind: AssetKind) -> &AssetRegistry {
        match kind {
            AssetKind::Css => &self.css,
            AssetKind::Js => &self.js,
        }
    }

    fn assets_mut(&mut self, kind: AssetKind) -> &mut AssetRegistry {
        match kind {
            AssetKind::Css => &mut self.css,
            AssetKind::Js => &mut self.js,
        }
    }

    fn strict(&self) -> bool {
        self.site.config.strict
    }

    // ------------------------------------------------------------------------
    // Page settings
    // ------------------------------------------------------------------------

    pub fn set_template(&mut self, template: &str) -> Result<&mut Self, LayoutError> {
        if !self.site.templates.is_template(template) {
            return Err(TemplateError::UnknownTemplate(template.to_string()).into());
        }
        self.template = template.to_string();
        Ok(self)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn set_charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = charset.into();
        self
    }

    /// Set a `<meta name=… content=…>` entry, replacing any previous value.
    pub fn set_metadata(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> &mut Self {
        self.metadata.insert(name.into(), content.into());
        self
    }

    /// Remove one metadata entry, or all of them for `None`.
    pub fn unset_metadata(&mut self, name: Option<&str>) -> &mut Self {
        match name {
            Some(name) => {
                self.metadata.remove(name);
            }
            None => self.metadata.clear(),
        }
        self
    }

    pub fn set_http_equiv(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> &mut Self {
        self.http_equiv.insert(name.into(), content.into());
        self
    }

    pub fn unset_http_equiv(&mut self, name: Option<&str>) -> &mut Self {
        match name {
            Some(name) => {
                self.http_equiv.remove(name);
            }
            None => self.http_equiv.clear(),
        }
        self
    }

    pub fn add_breadcrumb_item(
        &mut self,
        label: impl Into<String>,
        href: Option<&str>,
        position: Position,
    ) -> &mut Self {
        self.breadcrumb.add(
            BreadcrumbItem::new(label, href.map(str::to_string)),
            position,
        );
        self
    }

    pub fn remove_breadcrumb_item(&mut self, position: Position) -> Option<BreadcrumbItem> {
        self.breadcrumb.remove(position)
    }

    // ------------------------------------------------------------------------
    // Assets
    // ------------------------------------------------------------------------

    pub fn add_uri(
        &mut self,
        kind: AssetKind,
        path: &str,
        location: Location,
        attributes: Attributes,
        tags: Tags,
    ) -> Result<&mut Self, LayoutError> {
        self.assets_mut(kind)
            .add_uri(path, location, attributes, tags)?;
        Ok(self)
    }

    /// Local stylesheet without attributes or tags.
    pub fn add_css(&mut self, path: &str) -> Result<&mut Self, LayoutError> {
        self.add_uri(
            AssetKind::Css,
            path,
            Location::Local,
            Attributes::new(),
            Tags::new(),
        )
    }

    /// Local script without attributes or tags.
    pub fn add_js(&mut self, path: &str) -> Result<&mut Self, LayoutError> {
        self.add_uri(
            AssetKind::Js,
            path,
            Location::Local,
            Attributes::new(),
            Tags::new(),
        )
    }

    pub fn add_inline(
        &mut self,
        kind: AssetKind,
        content: impl Into<String>,
        attributes: Attributes,
        tags: Tags,
    ) -> Result<&mut Self, LayoutError> {
        self.assets_mut(kind).add_inline(content, attributes, tags)?;
        Ok(self)
    }

    pub fn add_computed(
        &mut self,
        kind: AssetKind,
        callback: &str,
        args: Vec<String>,
        attributes: Attributes,
        tags: Tags,
    ) -> Result<&mut Self, LayoutError> {
        let site = self.site;
        self.assets_mut(kind)
            .add_computed(callback, args, attributes, tags, &site.producers)?;
        Ok(self)
    }

    /// Register a uri asset described by an [`AssetSpec`].
    pub fn add_asset(
        &mut self,
        kind: AssetKind,
        spec: &AssetSpec,
    ) -> Result<&mut Self, LayoutError> {
        self.add_uri(
            kind,
            &spec.href,
            spec.location,
            spec.attributes.clone(),
            spec.tags.clone(),
        )
    }

    /// Register the configured basic assets of `kind` that pass `filter`.
    ///
    /// A basic asset that cannot be registered is a configuration mistake, so
    /// a missing file is an error here.
    pub fn add_basic(
        &mut self,
        kind: AssetKind,
        filter: &TagFilter,
    ) -> Result<&mut Self, LayoutError> {
        let site = self.site;
        for spec in site.config.basic_assets(kind) {
            if filter.matches(&spec.tags) {
                self.add_asset(kind, spec)?;
            }
        }
        Ok(self)
    }

    pub fn add_basic_assets(&mut self, filter: &TagFilter) -> Result<&mut Self, LayoutError> {
        self.add_basic(AssetKind::Css, filter)?;
        self.add_basic(AssetKind::Js, filter)
    }

    /// Register a local asset if its file exists; returns whether it did.
    fn add_optional(&mut self, kind: AssetKind, path: &str) -> Result<bool, LayoutError> {
        match self
            .assets_mut(kind)
            .add_uri(path, Location::Local, Attributes::new(), Tags::new())
        {
            Ok(()) => Ok(true),
            Err(e) if e.is_missing() => {
                tracing::debug!(%kind, path, "optional asset not found, skipping");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    /// Render `view` and return its markup, autoloading `css/<view>.css` and
    /// `js/<view>.js` for the kinds listed in `autoload`.
    pub fn return_view(
        &mut self,
        view: &str,
        data: &PageData,
        autoload: &[AssetKind],
    ) -> Result<String, LayoutError> {
        if !naming::is_relative_path(view) {
            return Err(ViewError::InvalidIdentifier(view.to_string()).into());
        }
        for &kind in autoload {
            self.add_optional(kind, &naming::view_asset_path(kind, view))?;
        }
        Ok(self.site.views.render(view, data)?)
    }

    /// Render `view` and append it to `section`.
    pub fn load_view(
        &mut self,
        view: &str,
        data: &PageData,
        section: &str,
        autoload: &[AssetKind],
    ) -> Result<&mut Self, LayoutError> {
        let markup = self.return_view(view, data, autoload)?;
        self.sections.append(section, &markup);
        Ok(self)
    }

    /// Render `view` into the default content section, then the whole page.
    pub fn render_view(
        &mut self,
        view: &str,
        data: &PageData,
        autoload: &[AssetKind],
    ) -> Result<String, LayoutError> {
        self.ensure_template()?;
        let site = self.site;
        self.load_view(view, data, &site.config.default_content_section, autoload)?;
        self.render()
    }

    /// Render the view of the routed action with its conventional assets.
    pub fn render_action_view(&mut self, data: &PageData) -> Result<String, LayoutError> {
        let action = self.route.action.clone();
        self.render_virtual_action_view(&action, data)
    }

    /// Like [`render_action_view`](Self::render_action_view) for an action
    /// name that need not match the route.
    ///
    /// Registers whichever of `app`, `controller` and `actions/<action>`
    /// assets exist for both kinds, then renders
    /// `controllers/<dir><controller>/actions/<action>`.
    pub fn render_virtual_action_view(
        &mut self,
        action: &str,
        data: &PageData,
    ) -> Result<String, LayoutError> {
        for kind in [AssetKind::Css, AssetKind::Js] {
            for path in naming::conventional_asset_paths(kind, &self.route, action) {
                self.add_optional(kind, &path)?;
            }
        }
        let view = naming::action_view(&self.route, action);
        self.render_view(&view, data, &[])
    }

    // ------------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------------

    fn ensure_template(&self) -> Result<(), LayoutError> {
        if self.site.templates.is_template(&self.template) {
            Ok(())
        } else {
            Err(TemplateError::UnknownTemplate(self.template.clone()).into())
        }
    }

    /// Render the page shell of the current template.
    pub fn render(&mut self) -> Result<String, LayoutError> {
        self.ensure_template()?;
        if self.strict() {
            self.check_unique()?;
        }
        let template = self.template.clone();
        let page = self.include_template(&template)?;
        if self.strict() {
            self.check_consumed()?;
        }
        tracing::debug!(template = %template, bytes = page.len(), "rendered page");
        Ok(page)
    }

    /// Render `template` through its own chain and return the markup.
    pub fn include_template(&mut self, template: &str) -> Result<String, LayoutError> {
        self.nested(template, |layout| {
            let site = layout.site;
            layout.chains.push_chain(&site.templates, template)?;
            let result = layout.render_root_entry();
            layout.chains.pop_chain();
            result
        })
    }

    /// Run `render` one nesting level deeper, failing past the limit.
    fn nested(
        &mut self,
        name: &str,
        render: impl FnOnce(&mut Self) -> Result<String, LayoutError>,
    ) -> Result<String, LayoutError> {
        if self.nesting >= MAX_INCLUDE_DEPTH {
            return Err(LayoutError::IncludeDepth {
                name: name.to_string(),
            });
        }
        self.nesting += 1;
        let result = render(self);
        self.nesting -= 1;
        result
    }

    fn render_root_entry(&mut self) -> Result<String, LayoutError> {
        let Some(root) = self.chains.current_root_template() else {
            return Ok(String::new());
        };
        let entry = self.site.templates.entry_file(root);
        if !entry.is_file() {
            return Err(TemplateError::MissingEntry {
                template: root.to_string(),
                path: entry,
            }
            .into());
        }
        self.render_file(&entry)
    }

    /// Markup of the most-derived definition of `block`, or nothing.
    pub fn block(&mut self, name: &str) -> Result<String, LayoutError> {
        let site = self.site;
        match self.chains.resolve_block(&site.templates, name)? {
            Some(file) => self.nested(name, |layout| layout.render_file(&file)),
            None => Ok(String::new()),
        }
    }

    fn render_file(&mut self, path: &Path) -> Result<String, LayoutError> {
        let source = fs::read_to_string(path)?;
        let nodes = directive::parse(&source).map_err(|err| LayoutError::Directive {
            path: path.to_path_buf(),
            source: err,
        })?;
        let mut out = String::with_capacity(source.len());
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Directive(d) => out.push_str(&self.apply(&d)?),
            }
        }
        Ok(out)
    }

    fn apply(&mut self, directive: &Directive) -> Result<String, LayoutError> {
        let markup = match directive {
            Directive::Title => self.trigger_title(),
            Directive::Charset => self.trigger_charset(),
            Directive::Metadata => self.trigger_metadata(),
            Directive::HttpEquiv => self.trigger_http_equiv(),
            Directive::Breadcrumb => self.trigger_breadcrumb(),
            Directive::Assets(kind, filter) => self.trigger_assets(*kind, filter)?,
            Directive::Section(name) => self.trigger_content_section(name)?,
            Directive::Block(name) => return self.block(name),
            Directive::Include(template) => return self.include_template(template),
        };
        Ok(markup.into_string())
    }

    fn check_unique(&self) -> Result<(), LayoutError> {
        for registry in [&self.css, &self.js] {
            if let Some(href) = registry.duplicate_hrefs().first() {
                return Err(LayoutError::DuplicateAsset {
                    kind: registry.kind(),
                    href: href.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_consumed(&self) -> Result<(), LayoutError> {
        for registry in [&self.css, &self.js] {
            let count = registry.untriggered().len();
            if count > 0 {
                return Err(LayoutError::UnconsumedAssets {
                    kind: registry.kind(),
                    count,
                });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Triggers
    // ------------------------------------------------------------------------

    pub fn trigger_title(&self) -> Markup {
        html! { title { (self.title) } }
    }

    pub fn trigger_charset(&self) -> Markup {
        html! { meta charset=(self.charset); }
    }

    pub fn trigger_metadata(&self) -> Markup {
        html! {
            @for (name, content) in &self.metadata {
                meta name=(name) content=(content);
            }
        }
    }

    pub fn trigger_http_equiv(&self) -> Markup {
        html! {
            @for (name, content) in &self.http_equiv {
                meta http-equiv=(name) content=(content);
            }
        }
    }

    pub fn trigger_breadcrumb(&self) -> Markup {
        self.breadcrumb.render(&self.site.config.breadcrumb)
    }

    /// Accumulated markup of `name`. Unset sections are empty, or an error in
    /// strict mode.
    pub fn trigger_content_section(&self, name: &str) -> Result<Markup, LayoutError> {
        match self.sections.try_get(name) {
            Some(markup) => Ok(PreEscaped(markup.to_string())),
            None if self.strict() => Err(LayoutError::UnknownContentSection(name.to_string())),
            None => Ok(PreEscaped(String::new())),
        }
    }

    pub fn trigger_assets(
        &mut self,
        kind: AssetKind,
        filter: &TagFilter,
    ) -> Result<Markup, LayoutError> {
        let site = self.site;
        let consume = site.config.strict;
        self.assets_mut(kind)
            .trigger(filter, consume, &site.producers)
            .map_err(LayoutError::from)
    }

    pub fn trigger_css(&mut self, filter: &TagFilter) -> Result<Markup, LayoutError> {
        self.trigger_assets(AssetKind::Css, filter)
    }

    pub fn trigger_js(&mut self, filter: &TagFilter) -> Result<Markup, LayoutError> {
        self.trigger_assets(AssetKind::Js, filter)
    }
}
