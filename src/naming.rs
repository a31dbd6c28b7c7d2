//! Identifier checks and convention-over-configuration path derivation.
//!
//! Template ids, block names, view ids and asset paths all end up as path
//! components under the site root. Everything that turns a caller-supplied
//! string into a filesystem path goes through this module, so `..` segments,
//! absolute paths and empty components are rejected in one place.
//!
//! ## Conventional Paths
//!
//! For a route `controller = "Welcome"`, `directory = "admin/"`,
//! `action = "hello"`:
//!
//! ```text
//! css/app.css
//! css/controllers/admin/Welcome/controller.css
//! css/controllers/admin/Welcome/actions/hello.css
//! views/controllers/admin/Welcome/actions/hello
//! ```
//!
//! and the same with `js/` for scripts.

use crate::types::{AssetKind, RouteInfo};
use std::path::{Path, PathBuf};

/// A single path component: non-empty, no separators, not `.`/`..`, no
/// leading dot.
///
/// - `"main_template"` → valid
/// - `"footer-partial.v2"` → valid
/// - `"../etc"` / `"a/b"` / `".hidden"` / `""` → invalid
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// A `/`-separated relative path whose every segment is an identifier.
pub fn is_relative_path(path: &str) -> bool {
    !path.is_empty() && path.split('/').all(is_identifier)
}

/// Join a `/`-separated relative path onto `base` using native separators.
pub fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(base.to_path_buf(), |acc, seg| acc.join(seg))
}

/// Asset autoloaded alongside a view: `css/<view>.css`, `js/<view>.js`.
pub fn view_asset_path(kind: AssetKind, view: &str) -> String {
    let ext = kind.extension();
    format!("{ext}/{view}.{ext}")
}

/// `controllers/<dir><controller>` with the directory normalized to end in `/`.
pub fn controller_path(route: &RouteInfo) -> String {
    let dir = route.directory.trim_matches('/');
    if dir.is_empty() {
        format!("controllers/{}", route.controller)
    } else {
        format!("controllers/{}/{}", dir, route.controller)
    }
}

/// View id for an action of the routed controller.
pub fn action_view(route: &RouteInfo, action: &str) -> String {
    format!("{}/actions/{}", controller_path(route), action)
}

/// The three conventional assets for an action, in registration order:
/// application-wide, controller-wide, action-specific.
pub fn conventional_asset_paths(kind: AssetKind, route: &RouteInfo, action: &str) -> Vec<String> {
    let ext = kind.extension();
    let controller = controller_path(route);
    vec![
        format!("{ext}/app.{ext}"),
        format!("{ext}/{controller}/controller.{ext}"),
        format!("{ext}/{controller}/actions/{action}.{ext}"),
    ]
}
