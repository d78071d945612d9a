//! Paths of everything a store keeps, relative to the store root.
//!
//! Every backend uses the same layout, so a local emulator tree can be pushed
//! to a GitHub Pages repository as-is.

use crate::manifest::ExtensionType;

/// The slim index listing every published package.
pub const STORE_INDEX_PATH: &str = "manifests/store-manifest.json";

/// Top-level folders recreated by a store reset.
pub const STORE_SUBTREES: [&str; 3] = ["packages", "assets", "manifests"];

pub const PACKAGE_EXTENSION: &str = "hub";

pub fn package_path(extension_type: ExtensionType, app_id: &str, version: &str) -> String {
    format!(
        "packages/{}/{}-v{}.{}",
        extension_type.subfolder(),
        app_id.to_lowercase(),
        version,
        PACKAGE_EXTENSION
    )
}

pub fn icon_path(extension_type: ExtensionType, app_id: &str) -> String {
    format!(
        "assets/icons/{}/{}.png",
        extension_type.subfolder(),
        app_id.to_lowercase()
    )
}

pub fn screenshot_path(extension_type: ExtensionType, app_id: &str, index: usize) -> String {
    format!(
        "assets/screenshots/{}/{}/{}.png",
        extension_type.subfolder(),
        app_id.to_lowercase(),
        index
    )
}

/// Full per-package record.
pub fn record_path(extension_type: ExtensionType, app_id: &str) -> String {
    format!(
        "manifests/{}/{}.json",
        extension_type.subfolder(),
        app_id.to_lowercase()
    )
}

/// Joins a base URL and a store-relative path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
