//! GitHub-backed store
//!
//! Packages, assets and manifests are committed to a repository through the
//! Contents API and downloaded from the repository's GitHub Pages site.

pub mod api;
pub mod store;

pub use api::{ContentsApi, RemoteObject};
pub use store::{GitHubBackend, GitHubConfig};
