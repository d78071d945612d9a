//! Publish targets.
//!
//! Three backends implement [`StoreBackend`]:
//! - [`FilesystemStore`] writes straight into a local store root,
//! - [`EmulatorBackend`] talks to a running local emulator over HTTP,
//! - [`GitHubBackend`] commits through the GitHub Contents API.

pub mod emulator;
pub mod filesystem;
pub mod github;
pub mod traits;

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

pub use emulator::EmulatorBackend;
pub use filesystem::FilesystemStore;
pub use github::{GitHubBackend, GitHubConfig};
pub use traits::StoreBackend;

pub const USER_AGENT: &str = concat!("henthub-store/", env!("CARGO_PKG_VERSION"));
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for creating a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Local store root on disk
    Filesystem {
        root: PathBuf,
        #[serde(default)]
        public_base: Option<String>,
    },
    /// Running local emulator
    Emulator { url: String },
    /// GitHub repository
    Github(GitHubConfig),
}

impl BackendConfig {
    pub fn create(self) -> Result<Box<dyn StoreBackend>> {
        Ok(match self {
            BackendConfig::Filesystem { root, public_base } => {
                let store = FilesystemStore::new(root);
                Box::new(match public_base {
                    Some(base) => store.with_public_base(base),
                    None => store,
                })
            }
            BackendConfig::Emulator { url } => Box::new(EmulatorBackend::new(url)?),
            BackendConfig::Github(config) => Box::new(GitHubBackend::new(config)?),
        })
    }
}

/// HTTP client shared by the network backends, optionally sending an `Authorization` header.
pub(crate) fn http_client(authorization: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT);

    if let Some(authorization) = authorization {
        let value = HeaderValue::from_str(authorization).map_err(|_| {
            StoreError::InvalidConfiguration("Invalid authentication token".to_string())
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        builder = builder.default_headers(headers);
    }

    builder.build().map_err(|e| {
        StoreError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
    })
}
