//! HentHub Store - package publishing for the HentHub app store
//!
//! This crate turns a filled-in publish form into a distributable `.hub`
//! package and publishes it to a store. A store is a plain file tree (local
//! directory, local emulator, or GitHub repository) holding packages, icons,
//! screenshots, one full manifest per package and a slim index listing every
//! package for browsing.
//!
//! # Publishing
//!
//! ```rust,no_run
//! use henthub_store::{EditSession, FormState, Publisher, stores::FilesystemStore, StoreBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FilesystemStore::new("./mock_github");
//!
//! let mut form = FormState::new();
//! form.prefill_from_manifest(&std::fs::read("MyApp/manifest.json")?)?;
//!
//! let index = store.load_index().await?;
//! let result = Publisher::new(&store).publish(&form, &index).await?;
//! println!("Published {} v{} -> {}", result.app_id, result.version, result.download_url);
//!
//! // Later: edit the published package
//! let session = EditSession::load(&store, "MYAPP").await?;
//! let form = FormState::for_edit(session)?;
//! # Ok(())
//! # }
//! ```
pub mod archive;
pub mod browse;
pub mod builder;
pub mod error;
pub mod form;
pub mod index;
pub mod layout;
pub mod manifest;
pub mod publish;
pub mod source;
pub mod stores;
pub mod validation;

pub use archive::Archive;
pub use error::{PublishError, PublishStep, Result, StoreError};
pub use form::{EditSession, FormState, SelectedFile};
pub use index::{
    SlimManifestEntry, StoreIndex, delete_from_index, project_to_slim, reconcile_index,
    reset_index,
};
pub use manifest::{
    ExtensionKind, ExtensionType, PackageManifest, PackageRecord, RefreshPolicy,
};
pub use publish::{PublishResult, Publisher};
pub use source::{collect_source_tree, find_manifest};
pub use stores::{BackendConfig, StoreBackend};
pub use validation::{BackendKind, ValidationGate, ValidationIssue, ValidationIssueType};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of this crate
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Icon published for terminal-only packages that do not bring their own.
pub const DEFAULT_TERMINAL_ICON: &[u8] = include_bytes!("../assets/terminal.png");
