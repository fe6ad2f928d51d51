//! [`AssetStore`] over an entry's `assets/` folder

use jotter_assets::{asset_file_name, AssetError, AssetResult, AssetStore, ASSETS_DIR};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FsAssetStore {
    entry_dir: PathBuf,
}

impl FsAssetStore {
    pub fn new(entry_dir: impl Into<PathBuf>) -> Self {
        Self {
            entry_dir: entry_dir.into(),
        }
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.entry_dir.join(ASSETS_DIR)
    }

    /// Absolute location of an entry-relative asset path
    pub fn resolve(&self, asset_path: &str) -> AssetResult<PathBuf> {
        let name = asset_file_name(asset_path).ok_or_else(|| AssetError::InvalidPath {
            path: asset_path.to_string(),
        })?;
        Ok(self.assets_dir().join(name))
    }
}

fn is_not_found(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::NotFound
}

impl AssetStore for FsAssetStore {
    fn exists(&self, asset_path: &str) -> bool {
        self.resolve(asset_path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn write(&self, asset_path: &str, bytes: &[u8]) -> AssetResult<()> {
        let path = self.resolve(asset_path)?;
        let write_error = |source| AssetError::Write {
            path: asset_path.to_string(),
            source,
        };
        fs::create_dir_all(self.assets_dir()).map_err(write_error)?;
        fs::write(&path, bytes).map_err(write_error)?;
        debug!(path = %path.display(), size = bytes.len(), "Wrote asset file");
        Ok(())
    }

    fn read(&self, asset_path: &str) -> AssetResult<Vec<u8>> {
        let path = self.resolve(asset_path)?;
        fs::read(&path).map_err(|source| {
            if is_not_found(&source) {
                AssetError::NotFound {
                    path: asset_path.to_string(),
                }
            } else {
                AssetError::Read {
                    path: asset_path.to_string(),
                    source,
                }
            }
        })
    }

    fn list_assets(&self) -> AssetResult<Vec<String>> {
        let read = match fs::read_dir(self.assets_dir()) {
            Ok(read) => read,
            Err(e) if is_not_found(&e) => return Ok(Vec::new()),
            Err(e) => return Err(AssetError::List(e)),
        };

        let mut names = Vec::new();
        for entry in read {
            let entry = entry.map_err(AssetError::List)?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn remove(&self, asset_path: &str) -> AssetResult<()> {
        let path = self.resolve(asset_path)?;
        fs::remove_file(&path).map_err(|source| {
            if is_not_found(&source) {
                AssetError::NotFound {
                    path: asset_path.to_string(),
                }
            } else {
                AssetError::Remove {
                    path: asset_path.to_string(),
                    source,
                }
            }
        })
    }

    fn size(&self, asset_path: &str) -> AssetResult<u64> {
        let path = self.resolve(asset_path)?;
        fs::metadata(&path)
            .map(|meta| meta.len())
            .map_err(|source| AssetError::Read {
                path: asset_path.to_string(),
                source,
            })
    }

    fn url_for(&self, asset_path: &str) -> String {
        match self.resolve(asset_path) {
            Ok(path) => file_url(&path),
            Err(_) => String::new(),
        }
    }
}

fn file_url(path: &Path) -> String {
    let display = path.to_string_lossy().replace('\\', "/");
    if display.starts_with('/') {
        format!("file://{}", display)
    } else {
        format!("file:///{}", display)
    }
}
