//! GitHub Contents API calls.
//!
//! Only the two primitives a publish needs: fetch an object (content plus its
//! blob SHA) and put an object (create, or update when the previous SHA is
//! passed along).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, StoreError};
use crate::stores::http_client;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// Response of `GET /repos/{owner}/{repo}/contents/{path}` for a file.
#[derive(Debug, Deserialize)]
pub struct ContentsResponse {
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub content: Vec<u8>,
    /// Revision token required to overwrite the object.
    pub sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Create an HTTP client that sends `Authorization: token <token>` on every request
pub fn create_authenticated_client(token: &str) -> Result<Client> {
    http_client(Some(&format!("token {}", token)))
}

pub struct ContentsApi {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    branch: Option<String>,
}

impl ContentsApi {
    pub fn new(
        client: Client,
        api_base: &str,
        owner: &str,
        repo: &str,
        branch: Option<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch,
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    /// Contents URL with the configured branch as an encoded `ref` query.
    fn contents_read_url(&self, path: &str) -> Result<Url> {
        let raw = self.contents_url(path);
        let mut url = Url::parse(&raw)
            .map_err(|e| StoreError::InvalidConfiguration(format!("Invalid URL '{}': {}", raw, e)))?;
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        Ok(url)
    }

    /// Fetch the contents metadata of a file, `None` if it does not exist yet.
    pub async fn get_contents(&self, path: &str) -> Result<Option<ContentsResponse>> {
        let url = self.contents_read_url(path)?;
        debug!("Fetching contents from GitHub API: {}", url);

        let request = self.client.get(url.as_str()).header("Accept", ACCEPT_HEADER);
        let response = request.send().await.map_err(|e| {
            StoreError::NetworkError(format!("Failed to fetch {} from GitHub: {}", path, e))
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response, url.as_str()).await);
        }

        let contents = response.json::<ContentsResponse>().await.map_err(|e| {
            StoreError::ParseError(format!(
                "Failed to parse GitHub contents response for {}: {}",
                path, e
            ))
        })?;
        Ok(Some(contents))
    }

    pub async fn get_sha(&self, path: &str) -> Result<Option<String>> {
        Ok(self.get_contents(path).await?.map(|c| c.sha))
    }

    /// Fetch a file with its content decoded.
    ///
    /// Files above the API's inline size limit come back without content;
    /// those are downloaded from their `download_url` instead.
    pub async fn get_object(&self, path: &str) -> Result<Option<RemoteObject>> {
        let Some(contents) = self.get_contents(path).await? else {
            return Ok(None);
        };

        let inline = contents
            .content
            .as_deref()
            .filter(|c| !c.is_empty() && contents.encoding.as_deref() != Some("none"));

        let content = match (inline, contents.download_url.as_deref()) {
            (Some(encoded), _) => decode_content(path, encoded)?,
            (None, Some(download_url)) if contents.size > 0 => {
                debug!("Downloading large file {} from {}", path, download_url);
                let response = self.client.get(download_url).send().await?;
                if !response.status().is_success() {
                    return Err(error_from_response(response, download_url).await);
                }
                response.bytes().await?.to_vec()
            }
            _ => Vec::new(),
        };

        Ok(Some(RemoteObject {
            content,
            sha: contents.sha,
        }))
    }

    /// Create or update a file. `sha` must be the current blob SHA when the file exists.
    pub async fn put_object(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        sha: Option<&str>,
    ) -> Result<()> {
        let url = self.contents_url(path);
        let body = PutContentsRequest {
            message,
            content: BASE64.encode(bytes),
            sha,
            branch: self.branch.as_deref(),
        };

        debug!(
            "Putting {} ({} bytes, {}) to GitHub API",
            path,
            bytes.len(),
            if sha.is_some() { "update" } else { "create" }
        );
        let response = self
            .client
            .put(&url)
            .header("Accept", ACCEPT_HEADER)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                StoreError::NetworkError(format!("Failed to upload {} to GitHub: {}", path, e))
            })?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &url).await);
        }
        Ok(())
    }
}

/// The API wraps base64 content at 60 columns.
fn decode_content(path: &str, encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|source| StoreError::InvalidEncoding {
            path: path.to_string(),
            source,
        })
}

async fn error_from_response(response: reqwest::Response, url: &str) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!("GitHub rejected the request to {}: {}", url, message);
        return StoreError::PermissionDenied(format!("{} ({})", message, status.as_u16()));
    }

    StoreError::HttpStatus {
        status: status.as_u16(),
        url: url.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wrapped_content() {
        let encoded = "aGVs\nbG8g\nd29y\nbGQ=\n";
        assert_eq!(decode_content("x", encoded).unwrap(), b"hello world");
    }

    #[test]
    fn test_decode_invalid_content() {
        let err = decode_content("x", "***").unwrap_err();
        assert!(matches!(err, StoreError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_branch_ref_is_query_encoded() {
        let api = ContentsApi::new(
            Client::new(),
            "https://api.github.com/",
            "hen",
            "store",
            Some("release/1.0 & beta".to_string()),
        );
        let url = api.contents_read_url("manifests/store-manifest.json").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/hen/store/contents/manifests/store-manifest.json?ref=release%2F1.0+%26+beta"
        );

        let api = ContentsApi::new(Client::new(), "https://api.github.com", "hen", "store", None);
        assert!(api.contents_read_url("a.png").unwrap().query().is_none());
    }

    #[test]
    fn test_put_request_omits_missing_sha() {
        let body = PutContentsRequest {
            message: "Update DEMO icon",
            content: "AA==".to_string(),
            sha: None,
            branch: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "message": "Update DEMO icon", "content": "AA==" })
        );
    }
}
