//! Typed form state handed from the operator surface to the core.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::index::same_identity;
use crate::layout;
use crate::manifest::{
    ApplicationEntry, CANONICAL_ICON_NAME, DEFAULT_MIN_OS_VERSION, ExtensionKind, ExtensionType,
    PackageManifest, PackageRecord, RefreshPolicy, WidgetConfig, WidgetSize,
};
use crate::stores::StoreBackend;

/// A file picked by the operator. `path` is relative, as a dropped folder would report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    /// Path with `/` separators.
    pub fn normalized_path(&self) -> String {
        self.path.replace('\\', "/")
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path)
    }
}

/// State of a publish started from an already published package.
#[derive(Debug, Clone)]
pub struct EditSession {
    /// Identity as stored in the index.
    pub app_id: String,
    pub extension_type: ExtensionType,
    /// Version at the time the session started. New files require a different one.
    pub initial_version: String,
    /// Slim entry merged with the full record, when one could be read.
    pub document: Value,
    pub record: Option<PackageRecord>,
    pub screenshot_count: usize,
}

impl EditSession {
    /// Looks `app_id` up in the backend's index and merges in its full record.
    pub async fn load(backend: &dyn StoreBackend, app_id: &str) -> Result<Self> {
        let index = backend.load_index().await?;
        let entry = index
            .find(app_id)
            .cloned()
            .ok_or_else(|| StoreError::AppNotFound(app_id.to_string()))?;

        let mut document = serde_json::to_value(&entry)?;
        let record = match backend.load_record(entry.extension_type, &entry.app_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not fetch full manifest for {}: {}", entry.app_id, e);
                None
            }
        };

        if let Some(record) = &record {
            info!(
                "Merging full manifest {}",
                layout::record_path(entry.extension_type, &entry.app_id)
            );
            if let (Some(target), Value::Object(full)) =
                (document.as_object_mut(), record.to_json_value()?)
            {
                target.extend(full);
            }
        }

        Ok(Self {
            app_id: entry.app_id.clone(),
            extension_type: entry.extension_type,
            initial_version: entry.version.clone(),
            screenshot_count: record
                .as_ref()
                .map(|r| r.screenshot_count)
                .unwrap_or(entry.screenshot_count),
            document,
            record,
        })
    }
}

/// Every field of the publish form, as typed values.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub app_id: String,
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub extension_type: ExtensionType,
    pub terminal_only: bool,
    pub single_instance: bool,
    pub min_os_version: String,
    pub permissions: Vec<String>,
    pub dependencies: Vec<String>,
    pub references: Vec<String>,

    pub entry_point: String,
    pub entry_class: String,
    pub entry_method: String,

    pub widget_class: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub is_resizable: bool,
    pub refresh_policy: RefreshPolicy,
    pub interval_ms: Option<u64>,
    pub subscriptions: Vec<String>,

    pub icon: Option<SelectedFile>,
    pub screenshots: Vec<SelectedFile>,
    pub source_files: Vec<SelectedFile>,
    /// Icon file name declared by the manifest the form was filled from.
    pub manifest_icon_name: Option<String>,
    /// GitHub token, only needed for the remote backend.
    pub credential: Option<String>,
    pub edit: Option<EditSession>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an edit of an existing package, prefilled from its stored record.
    pub fn for_edit(session: EditSession) -> Result<Self> {
        let mut form = FormState::new();
        form.prefill_from_document(&session.document)?;
        form.app_id = session.app_id.clone();
        form.version = session.initial_version.clone();
        form.edit = Some(session);
        Ok(form)
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit.is_some()
    }

    /// Edit mode without a new source tree: the previous archive gets patched.
    pub fn is_metadata_only_edit(&self) -> bool {
        self.is_edit_mode() && self.source_files.is_empty()
    }

    pub fn has_new_files(&self) -> bool {
        !self.source_files.is_empty() || self.icon.is_some()
    }

    pub fn normalized_app_id(&self) -> String {
        self.app_id.trim().to_uppercase()
    }

    /// Lowercased icon name the source tree must provide.
    pub fn expected_icon_name(&self) -> String {
        self.manifest_icon_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(CANONICAL_ICON_NAME)
            .to_lowercase()
    }

    /// Adds a dependency unless it is the package itself or already listed.
    pub fn add_dependency(&mut self, app_id: &str) -> bool {
        let app_id = app_id.trim();
        if app_id.is_empty() {
            return false;
        }
        if same_identity(app_id, self.app_id.trim()) {
            warn!("Cannot add {} as a dependency to itself", app_id);
            return false;
        }
        if self.dependencies.iter().any(|d| d == app_id) {
            return false;
        }
        self.dependencies.push(app_id.to_string());
        true
    }

    /// Reads a `manifest.json` and fills in every field it declares.
    pub fn prefill_from_manifest(&mut self, bytes: &[u8]) -> Result<()> {
        let document: Value = serde_json::from_slice(bytes).map_err(|e| {
            StoreError::InvalidManifest(format!(
                "Error parsing manifest.json, please ensure it is valid JSON: {}",
                e
            ))
        })?;
        self.prefill_from_document(&document)
    }

    /// Fills the form from a manifest-shaped JSON document. Fields absent from
    /// the document keep their current value.
    pub fn prefill_from_document(&mut self, doc: &Value) -> Result<()> {
        let extension_type = match doc.get("extensionType").and_then(Value::as_str) {
            Some(kind) => kind.parse::<ExtensionType>()?,
            None => {
                return Err(StoreError::InvalidManifest(
                    "manifest is missing the required extensionType field (must be \"application\" or \"widget\")"
                        .to_string(),
                ));
            }
        };
        self.extension_type = extension_type;

        match extension_type {
            ExtensionType::Widget => {
                set_text(&mut self.widget_class, doc, "widgetClass");
                if let Some(policy) = text(doc, "refreshPolicy") {
                    self.refresh_policy = policy.parse()?;
                }
                if let Some(interval) = doc.get("intervalMs").and_then(Value::as_u64) {
                    self.interval_ms = Some(interval);
                }
                if let Some(size) = doc.get("defaultSize") {
                    if let Some(width) = size.get("width").and_then(Value::as_f64) {
                        self.width = Some(width);
                    }
                    if let Some(height) = size.get("height").and_then(Value::as_f64) {
                        self.height = Some(height);
                    }
                }
                set_flag(&mut self.is_resizable, doc, "isResizable");
                if let Some(subscriptions) = list(doc, "subscriptions") {
                    self.subscriptions = subscriptions;
                }
            }
            ExtensionType::Application => {
                set_text(&mut self.entry_point, doc, "entryPoint");
                set_text(&mut self.entry_class, doc, "entryClass");
                set_text(&mut self.entry_method, doc, "entryMethod");
                if self.entry_class.is_empty() {
                    set_text(&mut self.entry_class, doc, "mainClass");
                }
            }
        }

        set_flag(&mut self.single_instance, doc, "singleInstance");
        set_flag(&mut self.terminal_only, doc, "terminalOnly");

        if let Some(app_id) = text(doc, "appId").or_else(|| text(doc, "id")) {
            self.app_id = app_id;
        }
        set_text(&mut self.name, doc, "name");
        set_text(&mut self.version, doc, "version");
        set_text(&mut self.author, doc, "author");
        set_text(&mut self.description, doc, "description");
        set_text(&mut self.min_os_version, doc, "minOSVersion");

        if let Some(permissions) = list(doc, "permissions") {
            self.permissions = permissions;
        }
        if let Some(icon) = text(doc, "icon") {
            self.manifest_icon_name = Some(icon);
        }
        if let Some(dependencies) = list(doc, "dependencies") {
            self.dependencies.clear();
            for dependency in dependencies {
                self.add_dependency(&dependency);
            }
        }
        if let Some(references) = list(doc, "references").or_else(|| list(doc, "References")) {
            self.references = references;
        }

        Ok(())
    }

    /// Builds the in-archive manifest from the current field values.
    pub fn build_manifest(&self) -> PackageManifest {
        let kind = match self.extension_type {
            ExtensionType::Application => ExtensionKind::Application(ApplicationEntry {
                entry_point: self.entry_point.trim().to_string(),
                entry_class: self.entry_class.trim().to_string(),
                entry_method: self.entry_method.trim().to_string(),
            }),
            ExtensionType::Widget => ExtensionKind::Widget(WidgetConfig {
                widget_class: self.widget_class.trim().to_string(),
                default_size: WidgetSize {
                    width: self.width.unwrap_or_default(),
                    height: self.height.unwrap_or_default(),
                },
                is_resizable: self.is_resizable,
                refresh_policy: self.refresh_policy,
                interval_ms: self.interval_ms.unwrap_or_default(),
                subscriptions: self.subscriptions.clone(),
            }),
        };

        let min_os_version = match self.min_os_version.trim() {
            "" => DEFAULT_MIN_OS_VERSION.to_string(),
            v => v.to_string(),
        };

        PackageManifest {
            app_id: self.normalized_app_id(),
            name: self.name.trim().to_string(),
            kind,
            version: self.version.trim().to_string(),
            author: self.author.trim().to_string(),
            description: self.description.clone(),
            terminal_only: self.terminal_only,
            single_instance: self.single_instance,
            min_os_version,
            permissions: self.permissions.clone(),
            dependencies: self.dependencies.clone(),
            references: self.references.clone(),
            icon: CANONICAL_ICON_NAME.to_string(),
        }
    }
}

/// Splits a comma separated field, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn text(doc: &Value, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn set_text(target: &mut String, doc: &Value, key: &str) {
    if let Some(value) = text(doc, key) {
        *target = value;
    }
}

fn set_flag(target: &mut bool, doc: &Value, key: &str) {
    if let Some(value) = doc.get(key).and_then(Value::as_bool) {
        *target = value;
    }
}

/// Array of strings, or one comma separated string as typed into a form.
fn list(doc: &Value, key: &str) -> Option<Vec<String>> {
    match doc.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        Value::String(text) => Some(split_list(text)),
        _ => None,
    }
}
