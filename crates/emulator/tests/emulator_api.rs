use henthub_emulator::{EmulatorConfig, build_router};
use henthub_store::stores::EmulatorBackend;
use henthub_store::{
    Archive, FormState, Publisher, SelectedFile, StoreBackend, StoreError, StoreIndex,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

async fn spawn_emulator(config: EmulatorConfig) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(&config);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start(temp: &TempDir) -> String {
    spawn_emulator(EmulatorConfig::default().with_root(temp.path())).await
}

async fn post(base: &str, route: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/{}", base, route))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_upload_then_download() {
    let temp = TempDir::new().unwrap();
    let base = start(&temp).await;
    let backend = EmulatorBackend::new(&base).unwrap();

    backend
        .write_file("assets/icons/application/demo.png", &[1, 2, 3], "icon")
        .await
        .unwrap();

    let on_disk = std::fs::read(temp.path().join("assets/icons/application/demo.png")).unwrap();
    assert_eq!(on_disk, vec![1u8, 2, 3]);
    assert_eq!(
        backend
            .read_file("assets/icons/application/demo.png")
            .await
            .unwrap()
            .unwrap(),
        vec![1u8, 2, 3]
    );
    assert!(backend.read_file("assets/nothing.png").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upload_requires_path_and_content() {
    let temp = TempDir::new().unwrap();
    let base = start(&temp).await;

    let (status, body) = post(&base, "upload", json!({ "path": "a.bin" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Missing path or content");

    let (status, _) = post(&base, "upload", json!({ "path": "a.bin", "content": "" })).await;
    assert_eq!(status, 400);

    let err = EmulatorBackend::new(&base)
        .unwrap()
        .write_file("a.bin", &[], "empty")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::HttpStatus { status: 400, .. }));
}

#[tokio::test]
async fn test_escaping_paths_are_rejected() {
    let temp = TempDir::new().unwrap();
    let base = start(&temp).await;

    let (status, _) = post(
        &base,
        "upload",
        json!({ "path": "../escape.txt", "content": "aGk=" }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = post(
        &base,
        "update-manifest",
        json!({ "path": "/etc/store.json", "content": {} }),
    )
    .await;
    assert_eq!(status, 400);
    assert!(!temp.path().parent().unwrap().join("escape.txt").exists());
}

#[tokio::test]
async fn test_update_manifest_writes_pretty_json() {
    let temp = TempDir::new().unwrap();
    let base = start(&temp).await;

    let (status, body) = post(
        &base,
        "update-manifest",
        json!({ "path": "manifests/application/demo.json", "content": { "appId": "DEMO" } }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "success": true }));

    let written =
        std::fs::read_to_string(temp.path().join("manifests/application/demo.json")).unwrap();
    assert_eq!(written, "{\n  \"appId\": \"DEMO\"\n}");
}

#[tokio::test]
async fn test_delete_and_reset() {
    let temp = TempDir::new().unwrap();
    let base = start(&temp).await;
    let backend = EmulatorBackend::new(&base).unwrap();

    let (status, body) = post(&base, "delete-app", json!({ "appId": "DEMO" })).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Manifest not found");

    backend.reset().await.unwrap();
    for subtree in ["packages", "assets", "manifests"] {
        assert!(temp.path().join(subtree).is_dir());
    }
    let index = backend.load_index().await.unwrap();
    assert!(index.is_empty());
    assert_eq!(index.last_updated, "");

    let (status, body) = post(&base, "delete-app", json!({ "appId": "GHOST" })).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "App not found in manifest");

    let err = backend.delete_app("GHOST").await.unwrap_err();
    assert!(matches!(err, StoreError::AppNotFound(_)));
}

#[tokio::test]
async fn test_publish_through_emulator() {
    let temp = TempDir::new().unwrap();
    let base = start(&temp).await;
    let backend = EmulatorBackend::new(&base).unwrap();
    backend.reset().await.unwrap();

    let manifest = json!({
        "appId": "notes",
        "name": "Notes",
        "extensionType": "application",
        "version": "2.1.0",
        "author": "Ada",
        "entryPoint": "Notes.dll",
        "entryClass": "Notes.App",
        "entryMethod": "Run",
    })
    .to_string();
    let mut form = FormState::new();
    form.prefill_from_manifest(manifest.as_bytes()).unwrap();
    form.source_files = vec![
        SelectedFile::new("Notes/manifest.json", manifest.into_bytes()),
        SelectedFile::new("Notes/icon.png", vec![7u8]),
        SelectedFile::new("Notes/Notes.dll", vec![1u8, 2]),
    ];
    form.icon = Some(SelectedFile::new("icon.png", vec![7u8]));

    let result = Publisher::new(&backend)
        .publish(&form, &StoreIndex::default())
        .await
        .unwrap();
    assert_eq!(
        result.download_url,
        format!("{}/packages/application/notes-v2.1.0.hub", base)
    );

    let index = backend.load_index().await.unwrap();
    assert_eq!(index.apps.len(), 1);
    assert_eq!(index.apps[0].app_id, "NOTES");

    let package = backend
        .read_file("packages/application/notes-v2.1.0.hub")
        .await
        .unwrap()
        .unwrap();
    let archive = Archive::load(&package).unwrap();
    assert_eq!(archive.get("Notes/Notes.dll").unwrap(), &[1u8, 2]);

    backend.delete_app("notes").await.unwrap();
    assert!(backend.load_index().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_web_root_is_served_under_store() {
    let temp = TempDir::new().unwrap();
    let web = TempDir::new().unwrap();
    std::fs::write(web.path().join("upload.html"), "<h1>upload</h1>").unwrap();
    let base = spawn_emulator(
        EmulatorConfig::default()
            .with_root(temp.path())
            .with_web_root(web.path()),
    )
    .await;

    let page = reqwest::get(format!("{}/store/upload.html", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(page, "<h1>upload</h1>");
}
