//! Reading a package source folder from disk.

use std::path::Path;

use walkdir::WalkDir;

use crate::builder::is_manifest_path;
use crate::error::{Result, StoreError};
use crate::form::SelectedFile;

/// Collects every file below `dir`, in file-name order.
///
/// Paths are relative and start with the folder's own name (`MyApp/bin/App.dll`),
/// the way a dropped folder reports its files. The walk runs on the blocking pool.
pub async fn collect_source_tree(dir: &Path) -> Result<Vec<SelectedFile>> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || walk_source_tree(&dir))
        .await
        .map_err(|e| StoreError::IoError(std::io::Error::other(e)))?
}

fn walk_source_tree(dir: &Path) -> Result<Vec<SelectedFile>> {
    if !dir.is_dir() {
        return Err(StoreError::InvalidPath(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }

    let prefix = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| StoreError::IoError(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| StoreError::InvalidPath(entry.path().display().to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let path = if prefix.is_empty() {
            relative
        } else {
            format!("{}/{}", prefix, relative)
        };

        let bytes = std::fs::read(entry.path()).map_err(|source| StoreError::IoOperation {
            operation: "read".to_string(),
            path: entry.path().to_path_buf(),
            source,
        })?;
        files.push(SelectedFile::new(path, bytes));
    }
    Ok(files)
}

/// The shallowest `manifest.json` of a source tree.
pub fn find_manifest(files: &[SelectedFile]) -> Option<&SelectedFile> {
    files
        .iter()
        .filter(|f| is_manifest_path(&f.path))
        .min_by_key(|f| f.normalized_path().matches('/').count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_collect_prefixes_folder_name() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("MyApp");
        std::fs::create_dir_all(app.join("bin")).unwrap();
        std::fs::write(app.join("manifest.json"), "{}").unwrap();
        std::fs::write(app.join("icon.png"), [1u8]).unwrap();
        std::fs::write(app.join("bin/App.dll"), [2u8]).unwrap();

        let files = collect_source_tree(&app).await.unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["MyApp/bin/App.dll", "MyApp/icon.png", "MyApp/manifest.json"]
        );
        assert_eq!(find_manifest(&files).unwrap().path, "MyApp/manifest.json");
    }

    #[test]
    fn test_find_manifest_prefers_shallowest() {
        let files = vec![
            SelectedFile::new("A/Plugin/manifest.json", b"{}".to_vec()),
            SelectedFile::new("A/manifest.json", b"{}".to_vec()),
        ];
        assert_eq!(find_manifest(&files).unwrap().path, "A/manifest.json");
        assert!(find_manifest(&[]).is_none());
    }

    #[tokio::test]
    async fn test_collect_rejects_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("x.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(collect_source_tree(&file).await.is_err());
    }
}
