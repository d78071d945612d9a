//! Publish coordination: validate, package, dispatch, reconcile.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::DEFAULT_TERMINAL_ICON;
use crate::archive::Archive;
use crate::builder::{BuildInputs, build_archive};
use crate::error::{PublishError, PublishStep, StoreError};
use crate::form::{EditSession, FormState};
use crate::index::{StoreIndex, project_to_slim, reconcile_index, same_identity};
use crate::layout;
use crate::manifest::{PackageRecord, now_timestamp};
use crate::stores::StoreBackend;
use crate::validation::{ValidationGate, ValidationIssue};

/// Result of a successful publish operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub app_id: String,
    pub version: String,

    /// URL where the package can be downloaded
    pub download_url: String,
    pub icon_url: String,

    /// Size of the published archive in bytes
    pub package_size: u64,

    pub published_at: String,

    /// Store paths written, in order
    pub written: Vec<String>,

    /// Non-fatal problems, such as an edit that could not patch the previous archive
    pub warnings: Vec<String>,
}

/// Publishes forms to one backend.
///
/// Each publish is a single attempt: steps run in a fixed order and the first
/// failing backend call aborts the rest. Steps already written stay written.
pub struct Publisher<'a> {
    backend: &'a dyn StoreBackend,
    gate: ValidationGate,
    default_icon: Cow<'a, [u8]>,
}

impl<'a> Publisher<'a> {
    pub fn new(backend: &'a dyn StoreBackend) -> Self {
        Self {
            backend,
            gate: ValidationGate::default(),
            default_icon: Cow::Borrowed(DEFAULT_TERMINAL_ICON),
        }
    }

    pub fn with_gate(mut self, gate: ValidationGate) -> Self {
        self.gate = gate;
        self
    }

    /// Icon used for terminal-only packages published without one.
    pub fn with_default_icon(mut self, icon: Vec<u8>) -> Self {
        self.default_icon = Cow::Owned(icon);
        self
    }

    pub fn backend(&self) -> &dyn StoreBackend {
        self.backend
    }

    pub fn validate(&self, form: &FormState) -> Vec<ValidationIssue> {
        self.gate.validate(form, self.backend.kind())
    }

    /// Loads a published package for editing.
    pub async fn start_edit(&self, app_id: &str) -> Result<EditSession, PublishError> {
        EditSession::load(self.backend, app_id)
            .await
            .map_err(|source| not_found_or(app_id, PublishStep::ReadIndex, source))
    }

    /// Removes a package from the store listing. Its files stay in place.
    pub async fn delete(&self, app_id: &str) -> Result<(), PublishError> {
        self.backend
            .delete_app(app_id)
            .await
            .map_err(|source| not_found_or(app_id, PublishStep::StoreIndex, source))?;
        info!("Removed {} from {}", app_id, self.backend.name());
        Ok(())
    }

    /// Publish `form`, checking identity uniqueness against `cached_index`.
    pub async fn publish(
        &self,
        form: &FormState,
        cached_index: &StoreIndex,
    ) -> Result<PublishResult, PublishError> {
        self.gate.check(form, self.backend.kind())?;

        let manifest = form.build_manifest();
        let app_id = manifest.app_id.clone();
        let extension_type = manifest.extension_type();

        let editing_same = form
            .edit
            .as_ref()
            .is_some_and(|session| same_identity(&session.app_id, &app_id));
        if !editing_same && cached_index.contains(&app_id) {
            return Err(PublishError::DuplicateIdentity(app_id));
        }

        let mut warnings = Vec::new();
        let metadata_only = form.is_metadata_only_edit();
        let existing = if metadata_only {
            self.fetch_existing_archive(form, &mut warnings).await
        } else {
            None
        };

        let icon = match &form.icon {
            Some(file) => Some(file.bytes.as_slice()),
            None if manifest.terminal_only && !metadata_only => Some(self.default_icon.as_ref()),
            None => None,
        };

        let archive = build_archive(BuildInputs {
            existing,
            manifest: &manifest,
            icon: form.icon.as_ref().map(|f| f.bytes.as_slice()),
            default_icon: Some(self.default_icon.as_ref()),
            metadata_only,
            screenshots: &form.screenshots,
            source: &form.source_files,
        })
        .map_err(PublishError::PackagingFailed)?;
        let package = archive.serialize().map_err(PublishError::PackagingFailed)?;
        info!(
            "{} package created ({:.2} KB, {} entries)",
            layout::PACKAGE_EXTENSION,
            package.len() as f64 / 1024.0,
            archive.len()
        );

        let package_path = layout::package_path(extension_type, &app_id, &manifest.version);
        let icon_path = layout::icon_path(extension_type, &app_id);
        let download_url = self.backend.public_url(&package_path);
        let icon_url = self.backend.public_url(&icon_path);
        let published_at = now_timestamp();

        let screenshot_count = match (&form.edit, form.screenshots.len()) {
            (Some(session), 0) => session.screenshot_count,
            (_, count) => count,
        };
        let record = PackageRecord {
            manifest: manifest.clone(),
            size: package.len() as u64,
            screenshot_count,
            download_url: download_url.clone(),
            icon_url: icon_url.clone(),
            published_date: published_at.clone(),
        };

        info!("Uploading {} to {}", app_id, self.backend.name());
        let mut written = Vec::new();

        self.write(
            PublishStep::Package,
            &package_path,
            &package,
            &format!("Update {} package (v{})", app_id, manifest.version),
        )
        .await?;
        written.push(package_path);

        if let Some(icon) = icon {
            self.write(
                PublishStep::Icon,
                &icon_path,
                icon,
                &format!("Update {} icon", app_id),
            )
            .await?;
            written.push(icon_path);
        }

        for (i, screenshot) in form.screenshots.iter().enumerate() {
            let path = layout::screenshot_path(extension_type, &app_id, i);
            self.write(
                PublishStep::Screenshot(i),
                &path,
                &screenshot.bytes,
                &format!("Upload {} screenshot", app_id),
            )
            .await?;
            written.push(path);
        }

        let record_path = layout::record_path(extension_type, &app_id);
        let document = to_document(&record)?;
        self.backend
            .write_json(&record_path, &document, &format!("Save full manifest: {}", app_id))
            .await
            .map_err(|source| PublishError::BackendWriteFailed {
                step: PublishStep::FullManifest,
                source,
            })?;
        written.push(record_path);

        let index = self
            .backend
            .load_index()
            .await
            .map_err(|source| PublishError::BackendWriteFailed {
                step: PublishStep::ReadIndex,
                source,
            })?;
        let index = reconcile_index(index, project_to_slim(&record, &download_url, &icon_url));
        self.backend
            .save_index(&index, &format!("Update store manifest (slim): {}", app_id))
            .await
            .map_err(|source| PublishError::BackendWriteFailed {
                step: PublishStep::StoreIndex,
                source,
            })?;
        written.push(layout::STORE_INDEX_PATH.to_string());

        info!(
            "Published {} v{} to {}",
            app_id,
            manifest.version,
            self.backend.name()
        );

        Ok(PublishResult {
            app_id,
            version: manifest.version,
            download_url,
            icon_url,
            package_size: record.size,
            published_at,
            written,
            warnings,
        })
    }

    async fn write(
        &self,
        step: PublishStep,
        path: &str,
        bytes: &[u8],
        message: &str,
    ) -> Result<(), PublishError> {
        self.backend
            .write_file(path, bytes, message)
            .await
            .map_err(|source| PublishError::BackendWriteFailed { step, source })
    }

    /// Loads the archive published under the version the edit started from.
    async fn fetch_existing_archive(
        &self,
        form: &FormState,
        warnings: &mut Vec<String>,
    ) -> Option<Archive> {
        let session = form.edit.as_ref()?;
        let path = layout::package_path(
            session.extension_type,
            &session.app_id,
            &session.initial_version,
        );
        info!("Fetching existing archive for patching: {}", path);

        let loaded = match self.backend.read_file(&path).await {
            Ok(Some(bytes)) => Archive::load(&bytes).map_err(|e| e.to_string()),
            Ok(None) => Err("no archive stored there".to_string()),
            Err(e) => Err(e.to_string()),
        };

        match loaded {
            Ok(archive) => Some(archive),
            Err(e) => {
                let warning = format!(
                    "Archive patching failed for {}: {}. Creating new partial archive.",
                    path, e
                );
                warn!("{}", warning);
                warnings.push(warning);
                None
            }
        }
    }
}

fn not_found_or(app_id: &str, step: PublishStep, source: StoreError) -> PublishError {
    if source.is_not_found() {
        PublishError::NotFound(app_id.to_string())
    } else {
        PublishError::BackendWriteFailed { step, source }
    }
}

/// Documents are encoded before any backend call, so a failure here is a packaging one.
fn to_document<T: Serialize>(value: &T) -> Result<serde_json::Value, PublishError> {
    serde_json::to_value(value).map_err(|e| PublishError::PackagingFailed(e.into()))
}
