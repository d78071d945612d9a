//! Listing helpers over the slim index.

use crate::index::{SlimManifestEntry, StoreIndex, same_identity};
use crate::layout;
use crate::stores::StoreBackend;

pub const INSTALL_SCHEME: &str = "henthub";

/// Case-insensitive substring match on name or identity. A blank query matches everything.
pub fn search<'a>(index: &'a StoreIndex, query: &str) -> Vec<&'a SlimManifestEntry> {
    let query = query.trim().to_lowercase();
    index
        .apps
        .iter()
        .filter(|app| matches_query(app, &query))
        .collect()
}

fn matches_query(app: &SlimManifestEntry, lowercase_query: &str) -> bool {
    app.name.to_lowercase().contains(lowercase_query)
        || app.app_id.to_lowercase().contains(lowercase_query)
}

/// Splits a listing into standard and terminal-only packages, keeping order.
pub fn partition_by_terminal<'a>(
    apps: impl IntoIterator<Item = &'a SlimManifestEntry>,
) -> (Vec<&'a SlimManifestEntry>, Vec<&'a SlimManifestEntry>) {
    apps.into_iter().partition(|app| !app.terminal_only)
}

/// Packages offered by the dependency picker.
///
/// Nothing is offered for a blank query. The package being edited and
/// dependencies already chosen are left out.
pub fn dependency_candidates<'a>(
    index: &'a StoreIndex,
    query: &str,
    current_id: &str,
    selected: &[String],
) -> Vec<&'a SlimManifestEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    index
        .apps
        .iter()
        .filter(|app| matches_query(app, &query))
        .filter(|app| !selected.iter().any(|s| s == &app.app_id))
        .filter(|app| !same_identity(&app.app_id, current_id.trim()))
        .collect()
}

/// The entry's icon URL, or where the backend stores its icon when none was recorded.
pub fn icon_url_or_default(app: &SlimManifestEntry, backend: &dyn StoreBackend) -> String {
    if app.icon_url.is_empty() {
        backend.public_url(&layout::icon_path(app.extension_type, &app.app_id))
    } else {
        app.icon_url.clone()
    }
}

/// Link handed to the desktop client to install a package.
pub fn install_link(app: &SlimManifestEntry) -> String {
    format!("{}://id?={}", INSTALL_SCHEME, app.app_id)
}
