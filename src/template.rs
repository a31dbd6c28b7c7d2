//! Template inheritance: the template store and the chain stack.
//!
//! ## Template Directories
//!
//! ```text
//! templates/
//! ├── main_template/
//! │   ├── template.toml        # no parent → root template
//! │   ├── layout.html          # entry file: the page shell
//! │   └── blocks/
//! │       └── menu_block.html  # default implementation of a block
//! ├── blog/
//! │   ├── template.toml        # parent = "main_template"
//! │   └── blocks/
//! │       └── menu_block.html  # overrides main_template's menu
//! └── footer_partial/
//!     ├── template.toml
//!     └── layout.html          # used through {% include footer_partial %}
//! ```
//!
//! ## Chains
//!
//! Pushing `blog` produces the chain `[blog, main_template]`: most-derived
//! first, root last. Block lookup walks the chain in that order and stops at
//! the first template that has the block file. The root's `layout.html` is
//! what gets rendered.
//!
//! Each top-level inclusion gets its own chain frame on a stack, so a block
//! that includes another template cannot disturb the chain of the page that
//! is including it.

use crate::naming;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const TEMPLATE_CONFIG_FILE: &str = "template.toml";
pub const ENTRY_FILE: &str = "layout.html";
pub const BLOCKS_DIR: &str = "blocks";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("unknown template: {0}")]
    UnknownTemplate(String),
    #[error("invalid template or block name: {0}")]
    InvalidIdentifier(String),
    #[error("missing {} for template {template}", TEMPLATE_CONFIG_FILE)]
    MissingTemplateConfig { template: String },
    #[error("invalid {} for template {template}: {source}", TEMPLATE_CONFIG_FILE)]
    InvalidTemplateConfig {
        template: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("cyclic template inheritance: {}", .chain.join(" -> "))]
    CyclicTemplate { chain: Vec<String> },
    #[error("root template {template} has no entry file: {}", .path.display())]
    MissingEntry { template: String, path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-template `template.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Template this one extends. `None` makes it a root template.
    pub parent: Option<String>,
}

/// Read-only view of the `templates/` directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, template: &str) -> PathBuf {
        self.root.join(template)
    }

    /// A template is a directory under the store root with a valid name.
    pub fn is_template(&self, template: &str) -> bool {
        naming::is_identifier(template) && self.dir(template).is_dir()
    }

    pub fn load_config(&self, template: &str) -> Result<TemplateConfig, TemplateError> {
        if !self.is_template(template) {
            return Err(TemplateError::UnknownTemplate(template.to_string()));
        }
        let path = self.dir(template).join(TEMPLATE_CONFIG_FILE);
        if !path.is_file() {
            return Err(TemplateError::MissingTemplateConfig {
                template: template.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|source| TemplateError::InvalidTemplateConfig {
            template: template.to_string(),
            source,
        })
    }

    pub fn entry_file(&self, template: &str) -> PathBuf {
        self.dir(template).join(ENTRY_FILE)
    }

    pub fn block_file(&self, template: &str, block: &str) -> PathBuf {
        self.dir(template)
            .join(BLOCKS_DIR)
            .join(format!("{block}.html"))
    }

    /// Names of all template directories, sorted.
    pub fn names(&self) -> Result<Vec<String>, TemplateError> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if naming::is_identifier(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Names of the blocks `template` defines itself, sorted.
    pub fn block_names(&self, template: &str) -> Result<Vec<String>, TemplateError> {
        let dir = self.dir(template).join(BLOCKS_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(walk_error)?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("html")
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Resolve the full chain of `template` outside of any render.
    pub fn resolve_chain(&self, template: &str) -> Result<Vec<String>, TemplateError> {
        let mut chains = TemplateChains::new();
        chains.push_chain(self, template)?;
        Ok(chains.pop_chain().unwrap_or_default())
    }

    /// Resolve every template directory.
    ///
    /// Per-template failures (bad config, cycles, a root without its entry
    /// file) are recorded in the result; only filesystem errors abort.
    pub fn check_all(&self) -> Result<Vec<TemplateCheck>, TemplateError> {
        let mut checks = Vec::new();
        for name in self.names()? {
            let chain = self.resolve_chain(&name).and_then(|chain| {
                let Some(root) = chain.last() else {
                    return Ok(chain);
                };
                let entry = self.entry_file(root);
                if entry.is_file() {
                    Ok(chain)
                } else {
                    Err(TemplateError::MissingEntry {
                        template: root.clone(),
                        path: entry,
                    })
                }
            });
            let blocks = self.block_names(&name)?;
            checks.push(TemplateCheck {
                name,
                chain,
                blocks,
            });
        }
        Ok(checks)
    }
}

/// Outcome of validating one template directory.
#[derive(Debug)]
pub struct TemplateCheck {
    pub name: String,
    pub chain: Result<Vec<String>, TemplateError>,
    /// Blocks defined by this template itself.
    pub blocks: Vec<String>,
}

fn walk_error(err: walkdir::Error) -> TemplateError {
    TemplateError::Io(err.into_io_error().unwrap_or_else(|| {
        std::io::Error::other("filesystem loop in templates directory")
    }))
}

/// Stack of template chains for one render.
#[derive(Debug, Clone, Default)]
pub struct TemplateChains {
    stack: Vec<Vec<String>>,
}

impl TemplateChains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new chain for `template` and resolve its ancestors.
    ///
    /// On error the half-built frame is discarded, leaving the stack as it was.
    pub fn push_chain(
        &mut self,
        store: &TemplateStore,
        template: &str,
    ) -> Result<(), TemplateError> {
        self.stack.push(Vec::new());
        if let Err(e) = self.push_chain_item(store, template) {
            self.stack.pop();
            return Err(e);
        }
        tracing::debug!(
            chain = ?self.current_chain(),
            depth = self.stack.len(),
            "pushed template chain"
        );
        Ok(())
    }

    /// Append `template` to the current chain, then its parent, recursively.
    pub fn push_chain_item(
        &mut self,
        store: &TemplateStore,
        template: &str,
    ) -> Result<(), TemplateError> {
        if !store.is_template(template) {
            return Err(TemplateError::UnknownTemplate(template.to_string()));
        }
        if self.stack.is_empty() {
            self.stack.push(Vec::new());
        }
        let Some(chain) = self.stack.last_mut() else {
            return Ok(());
        };
        if chain.iter().any(|t| t == template) {
            let mut cycle = chain.clone();
            cycle.push(template.to_string());
            return Err(TemplateError::CyclicTemplate { chain: cycle });
        }
        chain.push(template.to_string());

        match store.load_config(template)?.parent {
            Some(parent) => self.push_chain_item(store, &parent),
            None => Ok(()),
        }
    }

    pub fn pop_chain(&mut self) -> Option<Vec<String>> {
        self.stack.pop()
    }

    pub fn current_chain(&self) -> Option<&[String]> {
        self.stack.last().map(Vec::as_slice)
    }

    pub fn current_root_template(&self) -> Option<&str> {
        self.current_chain()
            .and_then(|chain| chain.last())
            .map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// First block file named `block` along the current chain, leaf-first.
    pub fn resolve_block(
        &self,
        store: &TemplateStore,
        block: &str,
    ) -> Result<Option<PathBuf>, TemplateError> {
        if !naming::is_identifier(block) {
            return Err(TemplateError::InvalidIdentifier(block.to_string()));
        }
        let Some(chain) = self.current_chain() else {
            return Ok(None);
        };
        for template in chain {
            let file = store.block_file(template, block);
            if file.is_file() {
                tracing::debug!(block, template = %template, "resolved block");
                return Ok(Some(file));
            }
        }
        tracing::debug!(block, "block not defined in chain");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{write_file, write_template};
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> TemplateStore {
        TemplateStore::new(tmp.path().join("templates"))
    }

    #[test]
    fn chain_is_leaf_first() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "t3", None);
        write_template(tmp.path(), "t2", Some("t3"));
        write_template(tmp.path(), "t1", Some("t2"));
        let store = store(&tmp);

        let mut chains = TemplateChains::new();
        chains.push_chain(&store, "t1").unwrap();
        assert_eq!(chains.current_chain().unwrap(), ["t1", "t2", "t3"]);
        assert_eq!(chains.current_root_template(), Some("t3"));
    }

    #[test]
    fn block_search_follows_chain_order() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "t3", None);
        write_template(tmp.path(), "t2", Some("t3"));
        write_template(tmp.path(), "t1", Some("t2"));
        write_file(tmp.path(), "templates/t3/blocks/menu.html", "t3 menu");
        write_file(tmp.path(), "templates/t2/blocks/menu.html", "t2 menu");
        write_file(tmp.path(), "templates/t3/blocks/footer.html", "t3 footer");
        write_file(tmp.path(), "templates/t1/blocks/title.html", "t1 title");
        let store = store(&tmp);

        let mut chains = TemplateChains::new();
        chains.push_chain(&store, "t1").unwrap();
        let hit = |name| chains.resolve_block(&store, name).unwrap().unwrap();
        assert_eq!(hit("menu"), store.block_file("t2", "menu"));
        assert_eq!(hit("footer"), store.block_file("t3", "footer"));
        assert_eq!(hit("title"), store.block_file("t1", "title"));
        assert_eq!(chains.resolve_block(&store, "sidebar").unwrap(), None);
    }

    #[test]
    fn child_inherits_parent_block() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "base", None);
        write_template(tmp.path(), "child", Some("base"));
        write_file(tmp.path(), "templates/base/blocks/menu.html", "base menu");
        let store = store(&tmp);

        let mut chains = TemplateChains::new();
        chains.push_chain(&store, "child").unwrap();
        assert_eq!(
            chains.resolve_block(&store, "menu").unwrap(),
            Some(store.block_file("base", "menu"))
        );
    }

    #[test]
    fn unknown_template_leaves_stack_untouched() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "child", Some("ghost"));
        let store = store(&tmp);

        let mut chains = TemplateChains::new();
        let err = chains.push_chain(&store, "child").unwrap_err();
        match err {
            TemplateError::UnknownTemplate(name) => assert_eq!(name, "ghost"),
            other => panic!("expected UnknownTemplate, got {other:?}"),
        }
        assert_eq!(chains.depth(), 0);
    }

    #[test]
    fn missing_template_config_is_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("templates/bare"))
            .unwrap();
        let err = store(&tmp).resolve_chain("bare").unwrap_err();
        assert!(matches!(err, TemplateError::MissingTemplateConfig { .. }));
    }

    #[test]
    fn invalid_template_config_is_error() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "templates/bad/template.toml", "extends = \"x\"");
        let err = store(&tmp).resolve_chain("bad").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidTemplateConfig { .. }));
    }

    #[test]
    fn cyclic_parents_are_detected() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "a", Some("b"));
        write_template(tmp.path(), "b", Some("a"));
        let err = store(&tmp).resolve_chain("a").unwrap_err();
        match err {
            TemplateError::CyclicTemplate { chain } => assert_eq!(chain, ["a", "b", "a"]),
            other => panic!("expected CyclicTemplate, got {other:?}"),
        }
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "loop", Some("loop"));
        assert!(matches!(
            store(&tmp).resolve_chain("loop"),
            Err(TemplateError::CyclicTemplate { .. })
        ));
    }

    #[test]
    fn nested_chains_are_independent() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "base", None);
        write_template(tmp.path(), "page", Some("base"));
        write_template(tmp.path(), "footer", None);
        let store = store(&tmp);

        let mut chains = TemplateChains::new();
        chains.push_chain(&store, "page").unwrap();
        chains.push_chain(&store, "footer").unwrap();
        assert_eq!(chains.depth(), 2);
        assert_eq!(chains.current_chain().unwrap(), ["footer"]);

        assert_eq!(chains.pop_chain().unwrap(), ["footer"]);
        assert_eq!(chains.current_chain().unwrap(), ["page", "base"]);
        chains.pop_chain();
        assert_eq!(chains.current_chain(), None);
        assert_eq!(chains.current_root_template(), None);
    }

    #[test]
    fn identifiers_are_validated() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "base", None);
        let store = store(&tmp);
        assert!(!store.is_template("../templates/base"));

        let mut chains = TemplateChains::new();
        chains.push_chain(&store, "base").unwrap();
        assert!(matches!(
            chains.resolve_block(&store, "../../layout"),
            Err(TemplateError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn block_lookup_without_chain_is_empty() {
        let tmp = TempDir::new().unwrap();
        let chains = TemplateChains::new();
        assert_eq!(chains.resolve_block(&store(&tmp), "menu").unwrap(), None);
    }

    #[test]
    fn block_names_lists_html_files() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "base", None);
        write_file(tmp.path(), "templates/base/blocks/menu.html", "");
        write_file(tmp.path(), "templates/base/blocks/footer.html", "");
        write_file(tmp.path(), "templates/base/blocks/notes.txt", "");
        let store = store(&tmp);
        assert_eq!(store.block_names("base").unwrap(), ["footer", "menu"]);
        write_template(tmp.path(), "bare", None);
        assert!(store.block_names("bare").unwrap().is_empty());
    }

    #[test]
    fn check_all_records_failures_per_template() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "base", None);
        write_file(tmp.path(), "templates/base/layout.html", "");
        write_template(tmp.path(), "child", Some("base"));
        write_template(tmp.path(), "orphan", Some("ghost"));
        write_template(tmp.path(), "shell", None);

        let checks = store(&tmp).check_all().unwrap();
        let names: Vec<&str> = checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["base", "child", "orphan", "shell"]);
        assert_eq!(checks[1].chain.as_ref().unwrap(), &["child", "base"]);
        assert!(matches!(
            checks[2].chain,
            Err(TemplateError::UnknownTemplate(_))
        ));
        assert!(matches!(
            checks[3].chain,
            Err(TemplateError::MissingEntry { .. })
        ));
    }

    #[test]
    fn names_lists_template_directories() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "zeta", None);
        write_template(tmp.path(), "alpha", Some("zeta"));
        write_file(tmp.path(), "templates/README.txt", "not a template");
        assert_eq!(store(&tmp).names().unwrap(), ["alpha", "zeta"]);
    }
}
