//! Assembles a package archive whose manifests all agree.

use tracing::debug;

use crate::archive::Archive;
use crate::error::Result;
use crate::form::SelectedFile;
use crate::manifest::{CANONICAL_ICON_NAME, MANIFEST_FILE_NAME, PackageManifest};

pub const SCREENSHOT_FOLDER: &str = "screenshots";

pub struct BuildInputs<'a> {
    /// Previously published archive, patched in place on a metadata-only edit.
    pub existing: Option<Archive>,
    pub manifest: &'a PackageManifest,
    pub icon: Option<&'a [u8]>,
    /// Used for terminal-only packages when no icon was supplied.
    pub default_icon: Option<&'a [u8]>,
    /// Set on a metadata-only edit; the default icon is then never written.
    pub metadata_only: bool,
    pub screenshots: &'a [SelectedFile],
    pub source: &'a [SelectedFile],
}

/// True for `manifest.json` at any depth, compared case-insensitively.
pub fn is_manifest_path(path: &str) -> bool {
    let path = path.replace('\\', "/").to_lowercase();
    path == MANIFEST_FILE_NAME || is_nested_manifest(&path)
}

fn is_nested_manifest(lowercase_path: &str) -> bool {
    lowercase_path.ends_with(&format!("/{}", MANIFEST_FILE_NAME))
}

/// Builds the archive for one publish.
///
/// Once this returns, every entry named `manifest.json` holds the canonical
/// serialization of `inputs.manifest`, byte for byte.
pub fn build_archive(inputs: BuildInputs<'_>) -> Result<Archive> {
    let mut archive = inputs.existing.unwrap_or_default();
    let canonical = inputs.manifest.canonical_bytes()?;

    archive.set_file(MANIFEST_FILE_NAME, canonical.clone());

    let nested: Vec<String> = archive
        .entries()
        .map(|entry| entry.path.clone())
        .filter(|path| is_nested_manifest(&path.to_lowercase()))
        .collect();
    for path in nested {
        debug!("Syncing internal manifest: {}", path);
        archive.set_file(path, canonical.clone());
    }

    if let Some(icon) = inputs.icon {
        archive.set_file(CANONICAL_ICON_NAME, icon);
    } else if inputs.manifest.terminal_only && !inputs.metadata_only {
        if let Some(default_icon) = inputs.default_icon {
            archive.set_file(CANONICAL_ICON_NAME, default_icon);
        }
    }

    for (i, screenshot) in inputs.screenshots.iter().enumerate() {
        archive.set_file(
            format!("{}/{}.png", SCREENSHOT_FOLDER, i),
            screenshot.bytes.clone(),
        );
    }

    for file in inputs.source {
        let path = file.normalized_path();
        let lowercase = path.to_lowercase();
        if lowercase == MANIFEST_FILE_NAME {
            continue;
        }
        if is_nested_manifest(&lowercase) {
            debug!("Syncing internal manifest: {}", path);
            archive.set_file(path, canonical.clone());
        } else {
            archive.set_file(path, file.bytes.clone());
        }
    }

    Ok(archive)
}
