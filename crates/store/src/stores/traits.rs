//! The storage interface every publish target implements.
//!
//! Backends only provide a handful of primitives (read a file, write a file,
//! write a JSON document). Index and record handling is layered on top as
//! provided methods so the publish coordinator never needs to know which
//! backend it talks to.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::index::{StoreIndex, delete_from_index};
use crate::layout::{self, STORE_INDEX_PATH};
use crate::manifest::{ExtensionType, PackageRecord};
use crate::validation::BackendKind;

#[async_trait]
pub trait StoreBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Human-readable name used in log lines.
    fn name(&self) -> &str;

    /// Public URL at which a stored file can be downloaded.
    fn public_url(&self, path: &str) -> String;

    /// Reads a stored file. `Ok(None)` when nothing is stored at `path`.
    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Stores raw bytes at `path`, overwriting any previous content.
    /// `message` is used as commit message by versioned backends.
    async fn write_file(&self, path: &str, bytes: &[u8], message: &str) -> Result<()>;

    /// Stores a pretty-printed JSON document at `path`.
    async fn write_json(&self, path: &str, document: &Value, message: &str) -> Result<()>;

    /// Loads the slim index, or an empty one if the store has none yet.
    async fn load_index(&self) -> Result<StoreIndex> {
        match self.read_file(STORE_INDEX_PATH).await? {
            Some(bytes) => StoreIndex::from_slice(&bytes),
            None => Ok(StoreIndex::default()),
        }
    }

    async fn save_index(&self, index: &StoreIndex, message: &str) -> Result<()> {
        self.write_json(STORE_INDEX_PATH, &index.to_json_value()?, message)
            .await
    }

    async fn load_record(
        &self,
        extension_type: ExtensionType,
        app_id: &str,
    ) -> Result<Option<PackageRecord>> {
        let path = layout::record_path(extension_type, app_id);
        match self.read_file(&path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Removes a package from the slim index. Stored files stay in place.
    ///
    /// Fails with [`StoreError::IndexNotFound`] when the store has no index and
    /// with [`StoreError::AppNotFound`] when no entry matches.
    async fn delete_app(&self, app_id: &str) -> Result<()> {
        let bytes = self
            .read_file(STORE_INDEX_PATH)
            .await?
            .ok_or_else(|| StoreError::IndexNotFound(STORE_INDEX_PATH.to_string()))?;
        let index = delete_from_index(StoreIndex::from_slice(&bytes)?, app_id)?;
        self.save_index(&index, &format!("Remove {} from store manifest", app_id))
            .await?;
        info!("[DELETED] App ID: {}", app_id);
        Ok(())
    }

    /// Clears every stored package, asset and manifest.
    async fn reset(&self) -> Result<()> {
        Err(StoreError::UnsupportedOperation(format!(
            "{} does not support resetting the store",
            self.name()
        )))
    }
}
