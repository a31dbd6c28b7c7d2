//! Shared test utilities for the simple-layout test suite.
//!
//! Two ways to get a site on disk:
//!
//! - [`setup_fixtures`] copies the demo site in `fixtures/site/` (templates
//!   `main_template`, `blog`, `footer_partial`, a few views and assets).
//! - [`write_file`] / [`write_template`] build a minimal site from scratch
//!   when a test needs full control over the markup.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_template(tmp.path(), "base", None);
//! write_file(tmp.path(), "templates/base/layout.html", "{% section main %}");
//! let site = Site::new(tmp.path(), LayoutConfig::default());
//! ```

use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

use crate::config::LayoutConfig;
use crate::layout::Site;
use crate::view::PageData;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Open the fixture copy with strict mode switched on.
pub fn strict_site(root: &Path) -> Site {
    let mut config = crate::config::load_config(root).unwrap();
    config.strict = true;
    Site::new(root, config)
}

// =========================================================================
// Ad-hoc site building
// =========================================================================

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Create `templates/<id>/template.toml`, with `parent` if given.
pub fn write_template(root: &Path, id: &str, parent: Option<&str>) {
    let config = match parent {
        Some(p) => format!("parent = \"{p}\"\n"),
        None => String::new(),
    };
    write_file(root, &format!("templates/{id}/template.toml"), &config);
}

/// Site over `root` with a root template `base` whose entry file is `layout`.
pub fn single_template_site(root: &Path, layout: &str, config: LayoutConfig) -> Site {
    write_template(root, "base", None);
    write_file(root, "templates/base/layout.html", layout);
    let mut config = config;
    config.default_template = "base".into();
    Site::new(root, config)
}

/// Convert a `json!` object into page data. Panics on non-objects.
pub fn json_data(value: Value) -> PageData {
    match value {
        Value::Object(map) => map,
        other => panic!("page data must be an object, got {other}"),
    }
}
