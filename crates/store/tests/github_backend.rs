use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use henthub_store::stores::{GitHubBackend, GitHubConfig};
use henthub_store::{StoreBackend, StoreError};
use mockito::Matcher;
use serde_json::json;

const INDEX_URL: &str = "/repos/octo/store/contents/manifests/store-manifest.json";

fn backend(server: &mockito::Server) -> GitHubBackend {
    let mut config = GitHubConfig::new("octo", "store", "ghp_test");
    config.api_base = server.url();
    GitHubBackend::new(config).unwrap()
}

fn contents_body(bytes: &[u8], sha: &str) -> String {
    json!({
        "sha": sha,
        "content": BASE64.encode(bytes),
        "encoding": "base64",
        "size": bytes.len(),
    })
    .to_string()
}

#[tokio::test]
async fn test_write_creates_missing_file_without_sha() {
    let mut server = mockito::Server::new_async().await;
    let path = "/repos/octo/store/contents/assets/icons/application/demo.png";

    let lookup = server
        .mock("GET", path)
        .match_header("authorization", "token ghp_test")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;
    let put = server
        .mock("PUT", path)
        .match_body(Matcher::Json(json!({
            "message": "Update DEMO icon",
            "content": BASE64.encode([1u8, 2, 3]),
        })))
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;

    backend(&server)
        .write_file("assets/icons/application/demo.png", &[1, 2, 3], "Update DEMO icon")
        .await
        .unwrap();

    lookup.assert_async().await;
    put.assert_async().await;
}

#[tokio::test]
async fn test_write_existing_file_sends_current_sha() {
    let mut server = mockito::Server::new_async().await;
    let path = "/repos/octo/store/contents/manifests/application/demo.json";

    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(contents_body(b"{}", "abc123"))
        .create_async()
        .await;
    let put = server
        .mock("PUT", path)
        .match_body(Matcher::PartialJson(json!({ "sha": "abc123" })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    backend(&server)
        .write_json(
            "manifests/application/demo.json",
            &json!({ "appId": "DEMO" }),
            "Save full manifest: DEMO",
        )
        .await
        .unwrap();

    put.assert_async().await;
}

#[tokio::test]
async fn test_read_decodes_wrapped_content() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/octo/store/contents/notes.txt")
        .with_status(200)
        .with_body(r#"{"sha":"f00","content":"aGVs\nbG8=\n","encoding":"base64","size":5}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/octo/store/contents/missing.txt")
        .with_status(404)
        .create_async()
        .await;

    let store = backend(&server);
    assert_eq!(store.read_file("notes.txt").await.unwrap().unwrap(), b"hello");
    assert!(store.read_file("missing.txt").await.unwrap().is_none());
}

fn large_file_body(server: &mockito::Server, size: usize) -> String {
    json!({
        "sha": "big1",
        "content": "",
        "encoding": "none",
        "size": size,
        "download_url": format!("{}/raw/packages/application/demo-v1.0.0.hub", server.url()),
    })
    .to_string()
}

#[tokio::test]
async fn test_read_large_file_follows_download_url() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "GET",
            "/repos/octo/store/contents/packages/application/demo-v1.0.0.hub",
        )
        .with_status(200)
        .with_body(large_file_body(&server, 5))
        .create_async()
        .await;
    let raw = server
        .mock("GET", "/raw/packages/application/demo-v1.0.0.hub")
        .match_header("authorization", "token ghp_test")
        .with_status(200)
        .with_body("HELLO")
        .create_async()
        .await;

    let bytes = backend(&server)
        .read_file("packages/application/demo-v1.0.0.hub")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bytes, b"HELLO");
    raw.assert_async().await;
}

#[tokio::test]
async fn test_read_large_file_download_failure_surfaces() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "GET",
            "/repos/octo/store/contents/packages/application/demo-v1.0.0.hub",
        )
        .with_status(200)
        .with_body(large_file_body(&server, 2_000_000))
        .create_async()
        .await;
    server
        .mock("GET", "/raw/packages/application/demo-v1.0.0.hub")
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let err = backend(&server)
        .read_file("packages/application/demo-v1.0.0.hub")
        .await
        .unwrap_err();
    match &err {
        StoreError::HttpStatus { status, url, .. } => {
            assert_eq!(*status, 503);
            assert!(url.ends_with("/raw/packages/application/demo-v1.0.0.hub"));
        }
        other => panic!("Expected HttpStatus, got {:?}", other),
    }
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_read_on_branch_sends_ref_query() {
    let mut server = mockito::Server::new_async().await;
    let lookup = server
        .mock("GET", "/repos/octo/store/contents/notes.txt")
        .match_query(Matcher::UrlEncoded("ref".into(), "release/1.0".into()))
        .with_status(200)
        .with_body(contents_body(b"hi", "f01"))
        .create_async()
        .await;

    let mut config = GitHubConfig::new("octo", "store", "ghp_test");
    config.api_base = server.url();
    config.branch = Some("release/1.0".to_string());
    let store = GitHubBackend::new(config).unwrap();

    assert_eq!(store.read_file("notes.txt").await.unwrap().unwrap(), b"hi");
    lookup.assert_async().await;
}

#[tokio::test]
async fn test_rejected_token_is_permission_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/octo/store/contents/notes.txt")
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;

    let err = backend(&server).read_file("notes.txt").await.unwrap_err();
    match err {
        StoreError::PermissionDenied(message) => assert!(message.contains("Bad credentials")),
        other => panic!("Expected PermissionDenied, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_rewrites_index_without_the_app() {
    let mut server = mockito::Server::new_async().await;
    let index = json!({
        "apps": [
            { "appId": "DEMO", "name": "Demo", "extensionType": "application", "version": "1.0.0" },
            { "appId": "CLOCK", "name": "Clock", "extensionType": "widget", "version": "2.0.0" },
        ],
        "lastUpdated": "2024-01-01T00:00:00.000Z",
    });

    let lookups = server
        .mock("GET", INDEX_URL)
        .with_status(200)
        .with_body(contents_body(index.to_string().as_bytes(), "idx1"))
        .expect(2)
        .create_async()
        .await;
    let put = server
        .mock("PUT", INDEX_URL)
        .match_body(Matcher::PartialJson(json!({ "sha": "idx1" })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    backend(&server).delete_app("demo").await.unwrap();

    lookups.assert_async().await;
    put.assert_async().await;
}

#[tokio::test]
async fn test_delete_without_index() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", INDEX_URL)
        .with_status(404)
        .create_async()
        .await;

    let err = backend(&server).delete_app("DEMO").await.unwrap_err();
    assert!(matches!(err, StoreError::IndexNotFound(_)));
}

#[test]
fn test_public_urls_point_at_pages() {
    let store = GitHubBackend::new(GitHubConfig::new("octo", "store", "ghp_test")).unwrap();
    assert_eq!(store.name(), "github:octo/store");
    assert_eq!(
        store.public_url("packages/application/demo-v1.0.0.hub"),
        "https://octo.github.io/store/packages/application/demo-v1.0.0.hub"
    );
}
