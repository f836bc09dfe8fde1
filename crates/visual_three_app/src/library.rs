// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media library: the assets available for placing on the timeline.

use indexmap::IndexMap;
use std::path::Path;
use thiserror::Error;
use visual_three_timeline::{AssetId, AssetRef, MediaKind};

/// Errors importing a file into the library
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file could not be inspected
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not an image, video or audio file
    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),
}

/// Build an asset reference for `path` from its extension and byte size
pub fn asset_from_path(path: &Path, size_bytes: u64) -> Result<AssetRef, ImportError> {
    let mime = mime_guess::from_path(path)
        .first_raw()
        .ok_or_else(|| ImportError::UnsupportedType(path.display().to_string()))?;
    let kind = MediaKind::from_mime(mime).ok_or_else(|| ImportError::UnsupportedType(mime.to_string()))?;

    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(AssetRef::new(path.display().to_string(), kind, name)
        .with_size(size_bytes)
        .with_preview(path.display().to_string()))
}

/// Ordered set of assets keyed by ID
#[derive(Debug, Clone, Default)]
pub struct MediaLibrary {
    assets: IndexMap<AssetId, AssetRef>,
}

impl MediaLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Import every path, logging and skipping the ones that fail
    pub fn from_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        let mut library = Self::new();
        for path in paths {
            let path = path.as_ref();
            if let Err(e) = library.import(path) {
                tracing::warn!("Skipping {}: {e}", path.display());
            }
        }
        library
    }

    /// Import a file from disk
    pub fn import(&mut self, path: &Path) -> Result<&AssetRef, ImportError> {
        let size = std::fs::metadata(path)?.len();
        let asset = asset_from_path(path, size)?;
        tracing::info!(kind = asset.kind.name(), "Imported {}", path.display());
        Ok(self.add(asset))
    }

    /// Add an asset, replacing one with the same ID
    pub fn add(&mut self, asset: AssetRef) -> &AssetRef {
        let id = asset.id.clone();
        self.assets.insert(id.clone(), asset);
        &self.assets[&id]
    }

    /// Remove an asset; clips already placed keep their copy of the reference
    pub fn remove(&mut self, id: &AssetId) -> Option<AssetRef> {
        self.assets.shift_remove(id)
    }

    /// Assets in import order
    pub fn assets(&self) -> impl Iterator<Item = &AssetRef> {
        self.assets.values()
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
