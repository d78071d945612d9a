//! Package manifest documents.
//!
//! Three shapes share these types:
//! - the in-archive manifest ([`PackageManifest`]), written to every `manifest.json`
//!   inside a package archive,
//! - the full record ([`PackageRecord`]), persisted per package under `manifests/`,
//! - the slim index entry, see [`crate::index::SlimManifestEntry`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// File name of every manifest inside a package archive.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Icon path inside a package archive. Always this literal, whatever the upload was called.
pub const CANONICAL_ICON_NAME: &str = "icon.png";

pub const DEFAULT_MIN_OS_VERSION: &str = "1.0.0";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionType {
    #[default]
    Application,
    Widget,
}

impl ExtensionType {
    /// Folder used for this type under `packages/`, `assets/` and `manifests/`.
    pub fn subfolder(&self) -> &'static str {
        match self {
            ExtensionType::Application => "application",
            ExtensionType::Widget => "widgets",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionType::Application => "application",
            ExtensionType::Widget => "widget",
        }
    }
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtensionType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "application" | "app" => Ok(ExtensionType::Application),
            "widget" => Ok(ExtensionType::Widget),
            other => Err(StoreError::InvalidManifest(format!(
                "extensionType must be \"application\" or \"widget\", got \"{}\"",
                other
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    #[default]
    Manual,
    Interval,
    OnEvent,
}

impl FromStr for RefreshPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Manual" | "manual" => Ok(RefreshPolicy::Manual),
            "Interval" | "interval" => Ok(RefreshPolicy::Interval),
            "OnEvent" | "onevent" | "on-event" => Ok(RefreshPolicy::OnEvent),
            other => Err(StoreError::InvalidManifest(format!(
                "unknown refresh policy \"{}\"",
                other
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEntry {
    #[serde(default)]
    pub entry_point: String,
    #[serde(default)]
    pub entry_class: String,
    #[serde(default)]
    pub entry_method: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct WidgetSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(default)]
    pub widget_class: String,
    #[serde(default)]
    pub default_size: WidgetSize,
    #[serde(default)]
    pub is_resizable: bool,
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
    /// Only meaningful with [`RefreshPolicy::Interval`].
    #[serde(default)]
    pub interval_ms: u64,
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

/// Type-specific part of a manifest, tagged by `extensionType`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "extensionType", rename_all = "lowercase")]
pub enum ExtensionKind {
    Application(ApplicationEntry),
    Widget(WidgetConfig),
}

impl ExtensionKind {
    pub fn extension_type(&self) -> ExtensionType {
        match self {
            ExtensionKind::Application(_) => ExtensionType::Application,
            ExtensionKind::Widget(_) => ExtensionType::Widget,
        }
    }
}

impl Default for ExtensionKind {
    fn default() -> Self {
        ExtensionKind::Application(ApplicationEntry::default())
    }
}

/// The manifest stored inside a package archive.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub app_id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: ExtensionKind,
    pub version: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub terminal_only: bool,
    #[serde(default)]
    pub single_instance: bool,
    #[serde(rename = "minOSVersion", default = "default_min_os_version")]
    pub min_os_version: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Library names carried through untouched.
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_min_os_version() -> String {
    DEFAULT_MIN_OS_VERSION.to_string()
}

fn default_icon() -> String {
    CANONICAL_ICON_NAME.to_string()
}

impl PackageManifest {
    pub fn extension_type(&self) -> ExtensionType {
        self.kind.extension_type()
    }

    /// Canonical serialization, written byte-identical to every manifest entry of an archive.
    pub fn canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.canonical_json()?.into_bytes())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            StoreError::InvalidManifest(format!("failed to parse {}: {}", MANIFEST_FILE_NAME, e))
        })
    }

    /// Lowercased identity used in storage paths.
    pub fn storage_id(&self) -> String {
        self.app_id.to_lowercase()
    }
}

/// Full per-package record: the manifest plus publish-time fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    #[serde(flatten)]
    pub manifest: PackageManifest,
    /// Byte length of the published archive.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub screenshot_count: usize,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub published_date: String,
}

impl PackageRecord {
    pub fn app_id(&self) -> &str {
        &self.manifest.app_id
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-05-01T10:00:00.123Z`.
pub fn iso_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    iso_timestamp(chrono::Utc::now())
}
