//! Store kept in a local directory tree.
//!
//! This is the storage engine behind the local emulator: the HTTP routes of
//! `henthub_emulator` call straight into it, and tests use it directly.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::index::reset_index;
use crate::layout::{self, STORE_INDEX_PATH, STORE_SUBTREES};
use crate::stores::StoreBackend;
use crate::validation::BackendKind;

pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
    public_base: String,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base: DEFAULT_PUBLIC_URL.to_string(),
        }
    }

    /// Base URL the stored tree is served from, used for download links.
    pub fn with_public_base(mut self, base: impl Into<String>) -> Self {
        self.public_base = base.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a store-relative path onto the root, refusing anything that escapes it.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if path.trim().is_empty() {
            return Err(StoreError::InvalidPath("empty path".to_string()));
        }

        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StoreError::InvalidPath(format!(
                        "'{}' must stay inside the store root",
                        path
                    )));
                }
            }
        }
        Ok(resolved)
    }

    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> Result<PathBuf> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            if !parent.exists() {
                debug!("[DIR] Creating directory: {}", parent.display());
            }
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::IoOperation {
                    operation: "create directory".to_string(),
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&full_path, bytes)
            .await
            .map_err(|source| StoreError::IoOperation {
                operation: "write".to_string(),
                path: full_path.clone(),
                source,
            })?;
        Ok(full_path)
    }
}

#[async_trait]
impl StoreBackend for FilesystemStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn name(&self) -> &str {
        "filesystem"
    }

    fn public_url(&self, path: &str) -> String {
        layout::join_url(&self.public_base, path)
    }

    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full_path = self.resolve(path)?;
        match tokio::fs::read(&full_path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::IoOperation {
                operation: "read".to_string(),
                path: full_path,
                source,
            }),
        }
    }

    async fn write_file(&self, path: &str, bytes: &[u8], _message: &str) -> Result<()> {
        if bytes.is_empty() {
            return Err(StoreError::EmptyContent(path.to_string()));
        }
        self.write_bytes(path, bytes).await?;
        info!(
            "[SAVED] {} ({:.2} KB)",
            path,
            bytes.len() as f64 / 1024.0
        );
        Ok(())
    }

    async fn write_json(&self, path: &str, document: &Value, _message: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(document)?;
        self.write_bytes(path, content.as_bytes()).await?;
        info!("[MANIFEST UPDATED] {}", path);
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        for subtree in STORE_SUBTREES {
            let full_path = self.resolve(subtree)?;
            if full_path.exists() {
                tokio::fs::remove_dir_all(&full_path).await.map_err(|source| {
                    StoreError::IoOperation {
                        operation: "remove directory".to_string(),
                        path: full_path.clone(),
                        source,
                    }
                })?;
            }
            tokio::fs::create_dir_all(&full_path)
                .await
                .map_err(|source| StoreError::IoOperation {
                    operation: "create directory".to_string(),
                    path: full_path.clone(),
                    source,
                })?;
        }

        let empty = serde_json::to_string_pretty(&reset_index())?;
        self.write_bytes(STORE_INDEX_PATH, empty.as_bytes()).await?;
        info!("[RESET] All store data cleared under {}", self.root.display());
        Ok(())
    }
}
