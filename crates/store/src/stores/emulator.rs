//! HTTP client of the local store emulator.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::error::{Result, StoreError};
use crate::layout;
use crate::stores::{StoreBackend, http_client};
use crate::validation::BackendKind;

/// Body of `POST /upload` and `POST /update-manifest`.
#[derive(Debug, Serialize)]
struct PathContent<'a, T: Serialize> {
    path: &'a str,
    content: T,
}

pub struct EmulatorBackend {
    client: Client,
    base_url: String,
}

impl EmulatorBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| {
            StoreError::InvalidConfiguration(format!("Invalid emulator URL '{}': {}", base_url, e))
        })?;
        Ok(Self {
            client: http_client(None)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> String {
        layout::join_url(&self.base_url, route)
    }

    async fn post<T: Serialize + ?Sized>(&self, route: &str, body: &T) -> Result<Response> {
        let url = self.endpoint(route);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        ensure_success(response, &url).await
    }
}

async fn ensure_success(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    Err(StoreError::HttpStatus {
        status: status.as_u16(),
        url: url.to_string(),
        message,
    })
}

#[async_trait]
impl StoreBackend for EmulatorBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn name(&self) -> &str {
        "local emulator"
    }

    fn public_url(&self, path: &str) -> String {
        self.endpoint(path)
    }

    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let url = self.endpoint(path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, &url).await?;
        Ok(Some(response.bytes().await?.to_vec()))
    }

    async fn write_file(&self, path: &str, bytes: &[u8], _message: &str) -> Result<()> {
        let body = PathContent {
            path,
            content: BASE64.encode(bytes),
        };
        self.post("upload", &body).await?;
        Ok(())
    }

    async fn write_json(&self, path: &str, document: &Value, _message: &str) -> Result<()> {
        let body = PathContent {
            path,
            content: document,
        };
        self.post("update-manifest", &body).await?;
        Ok(())
    }

    async fn delete_app(&self, app_id: &str) -> Result<()> {
        match self.post("delete-app", &json!({ "appId": app_id })).await {
            Err(StoreError::HttpStatus { status: 404, .. }) => {
                Err(StoreError::AppNotFound(app_id.to_string()))
            }
            other => other.map(|_| ()),
        }
    }

    async fn reset(&self) -> Result<()> {
        self.post("reset", &json!({})).await?;
        Ok(())
    }
}
