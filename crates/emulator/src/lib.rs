//! HentHub Store Emulator
//!
//! A local stand-in for the GitHub-hosted store. Publishing clients send files
//! to a handful of JSON endpoints, which land in a directory tree that is then
//! served back read-only, the same way GitHub Pages would serve the repository.
//!
//! | Route                   | Effect                                           |
//! |-------------------------|--------------------------------------------------|
//! | `POST /upload`          | `{path, content}` with base64 content            |
//! | `POST /update-manifest` | `{path, content}` with a JSON document           |
//! | `POST /delete-app`      | `{appId}` removed from the store index           |
//! | `POST /reset`           | wipes the store and writes an empty index        |
//! | `GET /store/...`        | the optional store website                       |
//! | `GET /...`              | any stored file                                  |
//!
//! ```rust,no_run
//! use henthub_emulator::{EmulatorConfig, serve};
//!
//! # async fn example() -> henthub_emulator::Result<()> {
//! serve(EmulatorConfig::default().with_root("./mock_github")).await
//! # }
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use henthub_store::stores::FilesystemStore;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod error;
pub mod routes;

pub use error::{EmulatorError, Result};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ROOT: &str = "mock_github";

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Directory the store lives in.
    pub root: PathBuf,
    /// Static store website mounted under `/store`.
    pub web_root: Option<PathBuf>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            root: PathBuf::from(DEFAULT_ROOT),
            web_root: None,
        }
    }
}

impl EmulatorConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_web_root(mut self, web_root: impl Into<PathBuf>) -> Self {
        self.web_root = Some(web_root.into());
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Base URL download links point at.
    pub fn public_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

#[derive(Clone)]
pub struct EmulatorState {
    pub store: FilesystemStore,
}

pub fn build_router(config: &EmulatorConfig) -> Router {
    let state = EmulatorState {
        store: FilesystemStore::new(&config.root).with_public_base(config.public_url()),
    };

    let mut router = Router::new()
        .route("/upload", post(routes::upload))
        .route("/update-manifest", post(routes::update_manifest))
        .route("/delete-app", post(routes::delete_app))
        .route("/reset", post(routes::reset))
        .with_state(state);

    if let Some(web_root) = &config.web_root {
        router = router.nest_service("/store", ServeDir::new(web_root));
    }

    router
        .fallback_service(ServeDir::new(&config.root))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Runs the emulator until Ctrl-C.
pub async fn serve(config: EmulatorConfig) -> Result<()> {
    tokio::fs::create_dir_all(&config.root)
        .await
        .map_err(|source| {
            EmulatorError::Store(henthub_store::StoreError::IoOperation {
                operation: "create directory".to_string(),
                path: config.root.clone(),
                source,
            })
        })?;

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| EmulatorError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!(
        "HentHub Store Emulator running at http://localhost:{}/store",
        config.port
    );
    if config.web_root.is_some() {
        info!(
            "Access Store: http://localhost:{}/store/upload.html",
            config.port
        );
    }
    info!("Files land in: {}", config.root.display());

    axum::serve(listener, build_router(&config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(EmulatorError::Serve)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down emulator"),
        Err(e) => {
            warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
