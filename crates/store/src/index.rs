//! The slim store index and its reconciliation rules.
//!
//! The index is a single JSON document shared by every publisher. It is always
//! read, modified and written back whole; there is no locking, so the last
//! writer wins.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::manifest::{now_timestamp, ExtensionType, PackageRecord};

/// Display-oriented projection of a package, as listed in the store index.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlimManifestEntry {
    pub app_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub extension_type: ExtensionType,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "minOSVersion", default)]
    pub min_os_version: String,
    #[serde(default)]
    pub terminal_only: bool,
    #[serde(default)]
    pub screenshot_count: usize,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub published_date: String,
}

impl SlimManifestEntry {
    pub fn matches_id(&self, app_id: &str) -> bool {
        same_identity(&self.app_id, app_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreIndex {
    #[serde(default)]
    pub apps: Vec<SlimManifestEntry>,
    #[serde(default)]
    pub last_updated: String,
}

impl StoreIndex {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn find(&self, app_id: &str) -> Option<&SlimManifestEntry> {
        self.apps.iter().find(|entry| entry.matches_id(app_id))
    }

    pub fn contains(&self, app_id: &str) -> bool {
        self.find(app_id).is_some()
    }

    /// Replaces the entry with the same identity, or appends a new one.
    ///
    /// An existing entry keeps its position in the list.
    pub fn upsert(&mut self, entry: SlimManifestEntry, now: &str) {
        match self.apps.iter().position(|e| e.matches_id(&entry.app_id)) {
            Some(pos) => self.apps[pos] = entry,
            None => self.apps.push(entry),
        }
        self.last_updated = now.to_string();
    }

    /// Removes exactly one entry. The index is left untouched when nothing matches.
    pub fn remove(&mut self, app_id: &str, now: &str) -> Result<SlimManifestEntry> {
        let pos = self
            .apps
            .iter()
            .position(|e| e.matches_id(app_id))
            .ok_or_else(|| StoreError::AppNotFound(app_id.to_string()))?;
        let removed = self.apps.remove(pos);
        self.last_updated = now.to_string();
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

pub fn same_identity(a: &str, b: &str) -> bool {
    a.to_uppercase() == b.to_uppercase()
}

/// Insert-or-replace `entry` by identity and stamp the index.
pub fn reconcile_index(mut index: StoreIndex, entry: SlimManifestEntry) -> StoreIndex {
    index.upsert(entry, &now_timestamp());
    index
}

/// Remove the entry matching `app_id`, or fail with [`StoreError::AppNotFound`].
pub fn delete_from_index(mut index: StoreIndex, app_id: &str) -> Result<StoreIndex> {
    index.remove(app_id, &now_timestamp())?;
    Ok(index)
}

pub fn project_to_slim(
    record: &PackageRecord,
    download_url: &str,
    icon_url: &str,
) -> SlimManifestEntry {
    let manifest = &record.manifest;
    SlimManifestEntry {
        app_id: manifest.app_id.clone(),
        name: manifest.name.clone(),
        extension_type: manifest.extension_type(),
        version: manifest.version.clone(),
        author: manifest.author.clone(),
        description: manifest.description.clone(),
        min_os_version: manifest.min_os_version.clone(),
        terminal_only: manifest.terminal_only,
        screenshot_count: record.screenshot_count,
        download_url: download_url.to_string(),
        icon_url: icon_url.to_string(),
        published_date: record.published_date.clone(),
    }
}

/// The empty index written by a full store reset.
pub fn reset_index() -> StoreIndex {
    StoreIndex::default()
}
