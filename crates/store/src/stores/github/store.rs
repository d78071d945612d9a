//! Store backed by a GitHub repository served through GitHub Pages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::api::{ContentsApi, DEFAULT_API_BASE, create_authenticated_client};
use crate::error::{Result, StoreError};
use crate::layout;
use crate::stores::StoreBackend;
use crate::validation::BackendKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Branch to commit to; the repository default when unset.
    #[serde(default)]
    pub branch: Option<String>,
    /// Overrides the `https://<owner>.github.io/<repo>` download base.
    #[serde(default)]
    pub pages_base: Option<String>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl GitHubConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
            api_base: default_api_base(),
            branch: None,
            pages_base: None,
        }
    }
}

pub struct GitHubBackend {
    api: ContentsApi,
    name: String,
    pages_base: String,
}

impl GitHubBackend {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        for (field, value) in [
            ("owner", &config.owner),
            ("repo", &config.repo),
            ("token", &config.token),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::InvalidConfiguration(format!(
                    "GitHub {} must not be empty",
                    field
                )));
            }
        }

        let client = create_authenticated_client(&config.token)?;
        let pages_base = config
            .pages_base
            .clone()
            .unwrap_or_else(|| format!("https://{}.github.io/{}", config.owner, config.repo));

        Ok(Self {
            api: ContentsApi::new(
                client,
                &config.api_base,
                &config.owner,
                &config.repo,
                config.branch.clone(),
            ),
            name: format!("github:{}/{}", config.owner, config.repo),
            pages_base,
        })
    }
}

#[async_trait]
impl StoreBackend for GitHubBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn public_url(&self, path: &str) -> String {
        layout::join_url(&self.pages_base, path)
    }

    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.api.get_object(path).await?.map(|object| object.content))
    }

    async fn write_file(&self, path: &str, bytes: &[u8], message: &str) -> Result<()> {
        let sha = self.api.get_sha(path).await?;
        self.api
            .put_object(path, bytes, message, sha.as_deref())
            .await?;
        info!("Pushed {} to {} ({} bytes)", path, self.name, bytes.len());
        Ok(())
    }

    async fn write_json(&self, path: &str, document: &Value, message: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(document)?;
        self.write_file(path, content.as_bytes(), message).await
    }
}
