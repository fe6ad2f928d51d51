use crate::error::{AssetError, AssetResult};
use crate::naming::{asset_file_name, ASSETS_DIR};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Host-side storage for one entry's assets
///
/// Paths are entry-relative (`assets/<name>`). Implementations must reject
/// paths that leave the assets directory.
pub trait AssetStore: Send + Sync {
    fn exists(&self, asset_path: &str) -> bool;

    fn write(&self, asset_path: &str, bytes: &[u8]) -> AssetResult<()>;

    fn read(&self, asset_path: &str) -> AssetResult<Vec<u8>>;

    /// Names of every file currently under `assets/`
    fn list_assets(&self) -> AssetResult<Vec<String>>;

    fn remove(&self, asset_path: &str) -> AssetResult<()>;

    /// Size in bytes
    fn size(&self, asset_path: &str) -> AssetResult<u64>;

    /// Display URL the surface uses for an asset
    fn url_for(&self, asset_path: &str) -> String {
        format!("asset://{}", asset_path)
    }
}

/// In-memory store for tests, with failure injection
#[derive(Default)]
pub struct MemoryAssetStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    failing_removals: Mutex<HashSet<String>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file by name without going through `write`
    pub fn add_file(&self, name: &str, bytes: &[u8]) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(name.to_string(), bytes.to_vec());
        }
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make removal of `name` fail
    pub fn fail_removal_of(&self, name: &str) {
        if let Ok(mut failing) = self.failing_removals.lock() {
            failing.insert(name.to_string());
        }
    }

    fn name_of<'a>(&self, asset_path: &'a str) -> AssetResult<&'a str> {
        asset_file_name(asset_path).ok_or_else(|| AssetError::InvalidPath {
            path: asset_path.to_string(),
        })
    }

    fn files(&self) -> AssetResult<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.files
            .lock()
            .map_err(|_| AssetError::Unavailable("memory store poisoned".to_string()))
    }
}

fn injected(path: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("injected failure for {}", path))
}

impl AssetStore for MemoryAssetStore {
    fn exists(&self, asset_path: &str) -> bool {
        match (self.name_of(asset_path), self.files()) {
            (Ok(name), Ok(files)) => files.contains_key(name),
            _ => false,
        }
    }

    fn write(&self, asset_path: &str, bytes: &[u8]) -> AssetResult<()> {
        let name = self.name_of(asset_path)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AssetError::Write {
                path: asset_path.to_string(),
                source: injected(asset_path),
            });
        }
        self.files()?.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, asset_path: &str) -> AssetResult<Vec<u8>> {
        let name = self.name_of(asset_path)?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AssetError::Read {
                path: asset_path.to_string(),
                source: injected(asset_path),
            });
        }
        self.files()?
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                path: asset_path.to_string(),
            })
    }

    fn list_assets(&self) -> AssetResult<Vec<String>> {
        Ok(self.files()?.keys().cloned().collect())
    }

    fn remove(&self, asset_path: &str) -> AssetResult<()> {
        let name = self.name_of(asset_path)?;
        let failing = self
            .failing_removals
            .lock()
            .map(|set| set.contains(name))
            .unwrap_or(false);
        if failing {
            return Err(AssetError::Remove {
                path: asset_path.to_string(),
                source: injected(asset_path),
            });
        }
        match self.files()?.remove(name) {
            Some(_) => Ok(()),
            None => Err(AssetError::NotFound {
                path: asset_path.to_string(),
            }),
        }
    }

    fn size(&self, asset_path: &str) -> AssetResult<u64> {
        let name = self.name_of(asset_path)?;
        self.files()?
            .get(name)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| AssetError::NotFound {
                path: asset_path.to_string(),
            })
    }
}

/// Entry-relative path of an asset file name
pub fn asset_path_of(name: &str) -> String {
    format!("{}/{}", ASSETS_DIR, name)
}
