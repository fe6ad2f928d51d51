//! Attaching files to a document.
//!
//! ```text
//! read_source ──▶ PreparedAsset ──import_prepared──▶ ImportedAsset ──to_node──▶ image/file node
//!   (async: fs read + hash)        (exists? skip : write)
//! ```

use crate::error::{AssetError, AssetResult};
use crate::naming::{asset_path_for, display_name, is_image_name, DEFAULT_DIGEST_LENGTH};
use crate::store::AssetStore;
use jotter_model::EditorNode;
use std::path::Path;
use tracing::{debug, info, instrument};

/// What kind of node an asset becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    File,
}

impl AssetKind {
    pub fn for_name(name: &str) -> Self {
        if is_image_name(name) {
            AssetKind::Image
        } else {
            AssetKind::File
        }
    }
}

/// Source bytes read and hashed, not yet stored
#[derive(Debug, Clone)]
pub struct PreparedAsset {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub asset_path: String,
}

/// Result of storing an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedAsset {
    pub asset_path: String,
    /// Name the user attached it under
    pub file_name: String,
    pub size: u64,
    pub kind: AssetKind,
    /// The bytes were already stored and no write happened
    pub deduplicated: bool,
}

impl ImportedAsset {
    /// Build the node that references this asset
    pub fn to_node(&self, id: impl Into<String>, url: impl Into<String>) -> EditorNode {
        match self.kind {
            AssetKind::Image => EditorNode::image(id, url, Some(self.asset_path.clone())),
            AssetKind::File => EditorNode::File {
                id: id.into(),
                url: url.into(),
                file_name: Some(self.file_name.clone()),
                file_size: Some(self.size),
                asset_path: Some(self.asset_path.clone()),
                align: Default::default(),
            },
        }
    }
}

/// Stores attachments in an [`AssetStore`] under content-addressed names
pub struct AssetImporter<'s, S: AssetStore + ?Sized> {
    store: &'s S,
    digest_length: usize,
}

impl<'s, S: AssetStore + ?Sized> AssetImporter<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            digest_length: DEFAULT_DIGEST_LENGTH,
        }
    }

    pub fn with_digest_length(mut self, digest_length: usize) -> Self {
        self.digest_length = digest_length;
        self
    }

    /// Hash and store `bytes`, skipping the write when identical content
    /// is already present
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn import_bytes(&self, file_name: &str, bytes: &[u8]) -> AssetResult<ImportedAsset> {
        let asset_path = asset_path_for(bytes, file_name, self.digest_length);
        self.store_at(asset_path, display_name(file_name).to_string(), bytes)
    }

    /// Store an asset prepared by [`read_source`]
    pub fn import_prepared(&self, prepared: PreparedAsset) -> AssetResult<ImportedAsset> {
        self.store_at(prepared.asset_path, prepared.file_name, &prepared.bytes)
    }

    fn store_at(&self, asset_path: String, file_name: String, bytes: &[u8]) -> AssetResult<ImportedAsset> {
        let deduplicated = self.store.exists(&asset_path);
        if deduplicated {
            debug!(asset_path = %asset_path, "Asset already stored");
        } else {
            self.store.write(&asset_path, bytes)?;
            info!(asset_path = %asset_path, size = bytes.len(), "Stored asset");
        }

        Ok(ImportedAsset {
            kind: AssetKind::for_name(&file_name),
            asset_path,
            file_name,
            size: bytes.len() as u64,
            deduplicated,
        })
    }
}

/// Read a source file and hash it off the calling task
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub async fn read_source(path: impl AsRef<Path>, digest_length: usize) -> AssetResult<PreparedAsset> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| AssetError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());

    let name_for_hash = file_name.clone();
    let (bytes, asset_path) = tokio::task::spawn_blocking(move || {
        let asset_path = asset_path_for(&bytes, &name_for_hash, digest_length);
        (bytes, asset_path)
    })
    .await
    .map_err(|e| AssetError::Unavailable(format!("hash task failed: {}", e)))?;

    Ok(PreparedAsset {
        file_name,
        bytes,
        asset_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAssetStore;

    #[test]
    fn test_same_bytes_dedup_across_names() {
        let store = MemoryAssetStore::new();
        let importer = AssetImporter::new(&store);

        let first = importer.import_bytes("cat.png", b"meow").unwrap();
        let second = importer.import_bytes("copy of cat.PNG", b"meow").unwrap();

        assert_eq!(first.asset_path, second.asset_path);
        assert!(!first.deduplicated);
        assert!(second.deduplicated);
        assert_eq!(store.file_names().len(), 1);
        assert_eq!(first.kind, AssetKind::Image);
    }

    #[test]
    fn test_failed_write_is_reported() {
        let store = MemoryAssetStore::new();
        store.set_fail_writes(true);
        let importer = AssetImporter::new(&store);
        assert!(importer.import_bytes("a.pdf", b"pdf").is_err());
    }

    #[test]
    fn test_file_node_carries_name_and_size() {
        let store = MemoryAssetStore::new();
        let imported = AssetImporter::new(&store)
            .import_bytes("/home/u/Report.pdf", b"12345")
            .unwrap();

        match imported.to_node("f1", "asset://x") {
            EditorNode::File {
                file_name,
                file_size,
                asset_path,
                ..
            } => {
                assert_eq!(file_name.as_deref(), Some("Report.pdf"));
                assert_eq!(file_size, Some(5));
                assert_eq!(asset_path, Some(imported.asset_path.clone()));
            }
            other => panic!("Expected file node, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_source_hashes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Notes.TXT");
        std::fs::write(&path, b"abc").unwrap();

        let prepared = read_source(&path, 16).await.unwrap();
        assert_eq!(prepared.file_name, "Notes.TXT");
        assert_eq!(prepared.asset_path, "assets/ba7816bf8f01cfea.txt");

        let store = MemoryAssetStore::new();
        let imported = AssetImporter::new(&store).import_prepared(prepared).unwrap();
        assert!(store.exists(&imported.asset_path));
    }

    #[tokio::test]
    async fn test_read_source_missing_file() {
        let result = read_source("/definitely/not/here.png", 16).await;
        assert!(matches!(result, Err(AssetError::Read { .. })));
    }
}
