//! # Jotter Workspace
//!
//! Filesystem host for the editor: entry folders under a data directory,
//! an [`AssetStore`](jotter_assets::AssetStore) over each entry's
//! `assets/` folder, a content sink for saves, change watching, and the
//! desktop actions behind the attachment context menu.

pub mod actions;
pub mod entry;
pub mod error;
pub mod fs_store;
pub mod icons;
pub mod watcher;

pub use actions::{FsAssetActions, Opener};
pub use entry::{EntrySink, EntryStore, CONTENT_FILE, EMPTY_CONTENT};
pub use error::{EntryError, EntryResult};
pub use fs_store::FsAssetStore;
pub use icons::PlatformIconProvider;
pub use watcher::{ContentWatcher, WatcherError, WatcherResult};

use jotter_editor::{EditSession, EditorConfig};

pub type EntrySession = EditSession<FsAssetStore, EntrySink>;

/// Open an entry for editing, with asset actions attached
pub fn open_entry(entries: &EntryStore, id: &str, config: EditorConfig) -> EntryResult<EntrySession> {
    if !entries.exists(id) {
        return Err(EntryError::NotFound(id.to_string()));
    }
    let content = entries.read_content(id)?;
    let store = entries.asset_store(id)?;
    let actions = FsAssetActions::new(store.clone());
    let sink = entries.sink(id)?;
    Ok(EditSession::open(&content, store, sink, config).with_actions(Box::new(actions)))
}
