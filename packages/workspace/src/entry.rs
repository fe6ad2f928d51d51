//! # Entry Folders
//!
//! Each entry lives in its own folder under the data directory:
//!
//! ```text
//! <data_dir>/
//!   <uuid>/
//!     content.json
//!     assets/
//!       <digest>.<ext>
//! ```
//!
//! A missing `content.json` reads as `"{}"`, which the editor loads as an
//! empty document. Content is written to a staging file in the same folder
//! and renamed over `content.json`, so readers never see a partial write.

use jotter_assets::ASSETS_DIR;
use jotter_editor::{ContentSink, HostError};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{EntryError, EntryResult};
use crate::fs_store::FsAssetStore;

pub const CONTENT_FILE: &str = "content.json";

/// Written first, then renamed over [`CONTENT_FILE`]
const CONTENT_STAGING_FILE: &str = "content.json.tmp";

/// Content returned for an entry that has never been saved
pub const EMPTY_CONTENT: &str = "{}";

#[derive(Debug, Clone)]
pub struct EntryStore {
    data_dir: PathBuf,
}

impl EntryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create a fresh entry folder with an empty `assets/` directory
    #[instrument(skip(self), fields(data_dir = %self.data_dir.display()))]
    pub fn create_entry(&self) -> EntryResult<String> {
        let id = Uuid::new_v4().to_string();
        let assets = self.data_dir.join(&id).join(ASSETS_DIR);
        fs::create_dir_all(&assets).map_err(|e| EntryError::io(&assets, e))?;
        info!(entry = %id, "Created entry");
        Ok(id)
    }

    /// Folder of an existing or future entry. Ids that could escape the
    /// data directory are rejected.
    pub fn entry_dir(&self, id: &str) -> EntryResult<PathBuf> {
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && !id.contains('\0');
        if !valid {
            return Err(EntryError::InvalidEntryId(id.to_string()));
        }
        Ok(self.data_dir.join(id))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.entry_dir(id).map(|dir| dir.is_dir()).unwrap_or(false)
    }

    /// Ids of every entry folder, sorted
    pub fn list_entries(&self) -> EntryResult<Vec<String>> {
        let read = match fs::read_dir(&self.data_dir) {
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(EntryError::io(&self.data_dir, e)),
        };

        let mut ids = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| EntryError::io(&self.data_dir, e))?;
            if entry.path().is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn read_content(&self, id: &str) -> EntryResult<String> {
        let path = self.entry_dir(id)?.join(CONTENT_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(entry = %id, "No content yet");
                Ok(EMPTY_CONTENT.to_string())
            }
            Err(e) => Err(EntryError::io(path, e)),
        }
    }

    pub fn write_content(&self, id: &str, content: &str) -> EntryResult<()> {
        let dir = self.entry_dir(id)?;
        if !dir.is_dir() {
            return Err(EntryError::NotFound(id.to_string()));
        }
        let path = dir.join(CONTENT_FILE);
        let staging = dir.join(CONTENT_STAGING_FILE);
        if let Err(e) = write_synced(&staging, content) {
            let _ = fs::remove_file(&staging);
            return Err(EntryError::io(&staging, e));
        }
        fs::rename(&staging, &path).map_err(|e| EntryError::io(&path, e))?;
        debug!(entry = %id, bytes = content.len(), "Wrote content");
        Ok(())
    }

    pub fn content_path(&self, id: &str) -> EntryResult<PathBuf> {
        Ok(self.entry_dir(id)?.join(CONTENT_FILE))
    }

    pub fn asset_store(&self, id: &str) -> EntryResult<FsAssetStore> {
        Ok(FsAssetStore::new(self.entry_dir(id)?))
    }

    /// Content sink that saves into this entry's `content.json`
    pub fn sink(&self, id: &str) -> EntryResult<EntrySink> {
        self.entry_dir(id)?;
        Ok(EntrySink {
            store: self.clone(),
            id: id.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct EntrySink {
    store: EntryStore,
    id: String,
}

impl EntrySink {
    pub fn entry_id(&self) -> &str {
        &self.id
    }
}

impl ContentSink for EntrySink {
    fn write_content(&mut self, content: &str) -> Result<(), HostError> {
        Ok(self.store.write_content(&self.id, content)?)
    }
}

fn write_synced(path: &Path, content: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_entry_makes_assets_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::new(dir.path());

        let id = store.create_entry().unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert!(dir.path().join(&id).join("assets").is_dir());
        assert_eq!(store.list_entries().unwrap(), vec![id]);
    }

    #[test]
    fn test_missing_content_reads_as_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::new(dir.path());
        let id = store.create_entry().unwrap();

        assert_eq!(store.read_content(&id).unwrap(), "{}");

        store.write_content(&id, "[]").unwrap();
        assert_eq!(store.read_content(&id).unwrap(), "[]");
    }

    #[test]
    fn test_rejects_escaping_ids() {
        let store = EntryStore::new("/tmp/jotter");
        for id in ["", ".", "..", "../x", "a/b", "a\\b"] {
            assert!(
                matches!(store.entry_dir(id), Err(EntryError::InvalidEntryId(_))),
                "accepted {:?}",
                id
            );
        }
    }

    #[test]
    fn test_write_to_unknown_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::new(dir.path());
        assert!(matches!(
            store.write_content("nope", "[]"),
            Err(EntryError::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_data_dir_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::new(dir.path().join("absent"));
        assert!(store.list_entries().unwrap().is_empty());
    }

    #[test]
    fn test_sink_writes_content_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::new(dir.path());
        let id = store.create_entry().unwrap();

        let mut sink = store.sink(&id).unwrap();
        sink.write_content(r#"[{"type":"paragraph"}]"#).unwrap();
        assert_eq!(store.read_content(&id).unwrap(), r#"[{"type":"paragraph"}]"#);
    }

    #[test]
    fn test_write_replaces_content_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::new(dir.path());
        let id = store.create_entry().unwrap();

        store.write_content(&id, r#"[{"type":"paragraph","id":"a"}]"#).unwrap();
        store.write_content(&id, "[]").unwrap();

        assert_eq!(store.read_content(&id).unwrap(), "[]");
        let mut names: Vec<String> = fs::read_dir(dir.path().join(&id))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["assets".to_string(), CONTENT_FILE.to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_write_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::new(dir.path());
        let id = store.create_entry().unwrap();
        store.write_content(&id, "[1]").unwrap();

        // A directory in the staging slot makes the write fail
        fs::create_dir(dir.path().join(&id).join(CONTENT_STAGING_FILE)).unwrap();
        assert!(matches!(
            store.write_content(&id, "[2]"),
            Err(EntryError::Io { .. })
        ));
        assert_eq!(store.read_content(&id).unwrap(), "[1]");
    }
}
