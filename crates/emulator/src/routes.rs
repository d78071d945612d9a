//! Write endpoints of the emulator. Reads are plain static file serving.

use axum::Json;
use axum::extract::State;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use henthub_store::StoreBackend;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::EmulatorState;
use crate::error::{EmulatorError, Result};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub path: Option<String>,
    /// Base64 file content.
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestRequest {
    pub path: Option<String>,
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub app_id: Option<String>,
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn upload(
    State(state): State<EmulatorState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<Value>> {
    let (Some(path), Some(content)) = (required(request.path), required(request.content)) else {
        return Err(EmulatorError::MissingPathOrContent);
    };

    let bytes = BASE64
        .decode(content.trim())
        .map_err(|e| EmulatorError::InvalidContent {
            path: path.clone(),
            message: e.to_string(),
        })?;
    state.store.write_file(&path, &bytes, "upload").await?;
    Ok(success())
}

pub async fn update_manifest(
    State(state): State<EmulatorState>,
    Json(request): Json<ManifestRequest>,
) -> Result<Json<Value>> {
    let Some(path) = required(request.path) else {
        return Err(EmulatorError::MissingPathOrContent);
    };
    state
        .store
        .write_json(&path, &request.content, "update manifest")
        .await?;
    Ok(success())
}

pub async fn delete_app(
    State(state): State<EmulatorState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Value>> {
    let app_id = required(request.app_id).ok_or(EmulatorError::MissingAppId)?;
    state.store.delete_app(&app_id).await?;
    Ok(success())
}

pub async fn reset(State(state): State<EmulatorState>) -> Result<Json<Value>> {
    state.store.reset().await?;
    Ok(success())
}
