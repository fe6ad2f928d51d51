//! # Edit Session
//!
//! The host-facing wrapper around an [`Editor`]: one open entry, its asset
//! store, and the sink its content is persisted to.
//!
//! The session owns the ambient behavior around editing:
//!
//! - dirty tracking against the last successfully saved content
//! - debounced autosave driven by [`EditSession::tick`]
//! - saves that sweep orphaned assets before writing
//! - external change notifications, ignored while there are unsaved edits
//! - asset attachment, with the insertion point captured before any await
//! - context-menu asset actions
//!
//! Failures never leave the session; they become [`Notification`]s.

use chrono::{DateTime, Utc};
use jotter_assets::{
    collect_garbage, read_source, AssetImporter, AssetStore, IconCache, IconProvider, ImportedAsset,
};
use jotter_common::TaskProgress;
use jotter_model::IdGenerator;
use jotter_surface::SurfaceFragment;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::autosave::Debouncer;
use crate::commands::{Command, CommandOutcome};
use crate::config::EditorConfig;
use crate::editor::{Editor, EditorEvent};
use crate::errors::EditorError;
use crate::guards::EditEvent;
use crate::mutations::Mutation;
use crate::selection::InsertionPoint;

pub type HostError = Box<dyn std::error::Error + Send + Sync>;

/// Where serialized content goes on save
pub trait ContentSink {
    fn write_content(&mut self, content: &str) -> Result<(), HostError>;
}

/// Context-menu actions on an attached asset
pub trait AssetActions: Send + Sync {
    fn open_externally(&self, asset_path: &str) -> Result<(), HostError>;

    fn reveal(&self, asset_path: &str) -> Result<(), HostError>;

    fn save_copy(&self, asset_path: &str, destination: &Path) -> Result<(), HostError>;
}

/// Sink that keeps every write in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub writes: Vec<String>,
    pub fail: bool,
}

impl ContentSink for MemorySink {
    fn write_content(&mut self, content: &str) -> Result<(), HostError> {
        if self.fail {
            return Err("disk full".into());
        }
        self.writes.push(content.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A user-facing toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Content written; orphaned assets removed first
    Saved { removed_assets: usize },
    /// Nothing changed since the last save; assets were still swept
    Clean,
    Failed,
}

pub struct EditSession<S: AssetStore, K: ContentSink> {
    editor: Editor,
    store: S,
    sink: K,
    actions: Option<Box<dyn AssetActions>>,
    config: EditorConfig,
    autosave: Debouncer,
    snapshot: String,
    last_saved_at: Option<DateTime<Utc>>,
    notifications: Vec<Notification>,
}

impl<S: AssetStore, K: ContentSink> EditSession<S, K> {
    pub fn open(source: &str, store: S, sink: K, config: EditorConfig) -> Self {
        Self::open_with_ids(source, IdGenerator::new(), store, sink, config)
    }

    pub fn open_with_ids(source: &str, ids: IdGenerator, store: S, sink: K, config: EditorConfig) -> Self {
        let editor = Editor::load_with_ids(source, ids, config.clone());
        let mut session = Self {
            editor,
            store,
            sink,
            actions: None,
            autosave: Debouncer::new(config.autosave_debounce()),
            config,
            snapshot: String::new(),
            last_saved_at: None,
            notifications: Vec::new(),
        };
        session.hydrate();
        session.snapshot = session.current_content();
        session.editor.drain_events();
        session
    }

    pub fn with_actions(mut self, actions: Box<dyn AssetActions>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Direct editor access. Call [`EditSession::touch`] afterwards so
    /// changes are scheduled for saving.
    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn autosave(&self) -> &Debouncer {
        &self.autosave
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn task_progress(&self) -> TaskProgress {
        self.editor.task_progress()
    }

    fn hydrate(&mut self) {
        let store = &self.store;
        self.editor
            .hydrate_assets(|path| store.size(path).ok(), |path| store.url_for(path));
    }

    fn current_content(&self) -> String {
        self.editor.serialize().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize document");
            String::new()
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.current_content() != self.snapshot
    }

    /// Schedule an autosave if the editor reported changes
    pub fn touch(&mut self, now: Instant) {
        let changed = self
            .editor
            .drain_events()
            .iter()
            .any(|e| matches!(e, EditorEvent::Changed { .. }));
        if changed {
            let handle = self.autosave.schedule(now);
            debug!(generation = handle.generation, "Autosave scheduled");
        }
    }

    fn report(&mut self, error: &EditorError) {
        warn!(error = %error, "Edit failed");
        self.notify(NotificationLevel::Error, error.to_string());
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            message: message.into(),
        });
    }

    // Editing

    pub fn apply(&mut self, mutations: Vec<Mutation>, now: Instant) -> bool {
        let result = self.editor.apply(mutations, "edit");
        self.touch(now);
        match result {
            Ok(_) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub fn dispatch(&mut self, command: Command, now: Instant) -> CommandOutcome {
        let result = self.editor.dispatch(command);
        self.touch(now);
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.report(&e);
                CommandOutcome::default()
            }
        }
    }

    pub fn handle_edit(&mut self, event: EditEvent, now: Instant) -> bool {
        let result = self.editor.handle_edit(event);
        self.touch(now);
        match result {
            Ok(changed) => changed,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub fn sync_from_surface(&mut self, fragment: &SurfaceFragment, now: Instant) -> bool {
        let result = self.editor.sync_from_surface(fragment);
        self.touch(now);
        match result {
            Ok(changed) => changed,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub fn sync_from_markup(&mut self, markup: &str, now: Instant) -> bool {
        let result = self.editor.sync_from_markup(markup);
        self.touch(now);
        match result {
            Ok(changed) => changed,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Surface with highlighting and icons applied
    pub fn render_enriched<P: IconProvider>(&self, icons: &mut IconCache<P>) -> SurfaceFragment {
        self.editor.render_enriched(|ext| icons.icon_for(ext))
    }

    // Persistence

    /// Run a due autosave
    pub fn tick(&mut self, now: Instant) -> Option<SaveOutcome> {
        self.autosave.poll(now).map(|_| self.save())
    }

    /// Sweep orphaned assets, then write. Writing clean content is skipped.
    #[instrument(skip(self), fields(version = self.editor.version()))]
    pub fn save(&mut self) -> SaveOutcome {
        self.autosave.cancel();

        let content = match self.editor.serialize() {
            Ok(content) => content,
            Err(e) => {
                self.report(&e);
                return SaveOutcome::Failed;
            }
        };

        let removed_assets = match collect_garbage(&self.store, self.editor.nodes()) {
            Ok(report) => report.removed.len(),
            Err(e) => {
                warn!(error = %e, "Asset sweep failed");
                0
            }
        };

        if content == self.snapshot {
            debug!(removed_assets, "Document clean, write skipped");
            return SaveOutcome::Clean;
        }

        if let Err(e) = self.sink.write_content(&content) {
            warn!(error = %e, "Failed to write content");
            self.notify(
                NotificationLevel::Error,
                EditorError::Persist(e.to_string()).to_string(),
            );
            return SaveOutcome::Failed;
        }

        self.snapshot = content;
        self.last_saved_at = Some(Utc::now());
        self.notify(NotificationLevel::Info, "Saved");
        info!(removed_assets, "Saved document");
        SaveOutcome::Saved { removed_assets }
    }

    /// Content changed outside the editor. Returns whether it was reloaded.
    pub fn external_change(&mut self, source: &str) -> bool {
        if self.is_dirty() {
            info!("Ignoring external change, document has unsaved edits");
            return false;
        }

        self.editor.reload(source);
        self.hydrate();
        self.snapshot = self.current_content();
        self.editor.drain_events();
        true
    }

    // Assets

    pub fn attach_bytes(&mut self, file_name: &str, bytes: &[u8], now: Instant) -> Option<ImportedAsset> {
        let point = self.editor.capture_insertion_point();
        let imported = AssetImporter::new(&self.store)
            .with_digest_length(self.config.digest_length)
            .import_bytes(file_name, bytes);

        match imported {
            Ok(asset) => self.insert_imported(asset, point, now),
            Err(e) => {
                self.report(&EditorError::from(e));
                None
            }
        }
    }

    /// Read, hash and store a file, then insert it where the cursor was
    /// when the call started
    pub async fn attach_file(&mut self, path: impl AsRef<Path>, now: Instant) -> Option<ImportedAsset> {
        let point = self.editor.capture_insertion_point();

        let prepared = match read_source(path, self.config.digest_length).await {
            Ok(prepared) => prepared,
            Err(e) => {
                self.report(&EditorError::from(e));
                return None;
            }
        };

        match AssetImporter::new(&self.store).import_prepared(prepared) {
            Ok(asset) => self.insert_imported(asset, point, now),
            Err(e) => {
                self.report(&EditorError::from(e));
                None
            }
        }
    }

    fn insert_imported(&mut self, asset: ImportedAsset, point: InsertionPoint, now: Instant) -> Option<ImportedAsset> {
        let url = self.store.url_for(&asset.asset_path);
        let result = self.editor.dispatch(Command::InsertAsset {
            asset: asset.clone(),
            url,
            at: Some(point),
        });
        self.touch(now);

        match result {
            Ok(_) => Some(asset),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    fn asset_path_of(&mut self, node_id: &str) -> Option<String> {
        let path = self
            .editor
            .document()
            .find(node_id)
            .and_then(|n| n.asset_path())
            .map(str::to_string);
        if path.is_none() {
            self.notify(NotificationLevel::Error, format!("No attachment with id {}", node_id));
        }
        path
    }

    fn run_action<F>(&mut self, node_id: &str, action: F) -> bool
    where
        F: FnOnce(&dyn AssetActions, &str) -> Result<(), HostError>,
    {
        let Some(asset_path) = self.asset_path_of(node_id) else {
            return false;
        };
        let Some(actions) = self.actions.as_deref() else {
            self.notify(NotificationLevel::Error, "Asset actions are not available");
            return false;
        };

        match action(actions, &asset_path) {
            Ok(()) => true,
            Err(e) => {
                warn!(asset_path = %asset_path, error = %e, "Asset action failed");
                self.notify(NotificationLevel::Error, e.to_string());
                false
            }
        }
    }

    pub fn open_asset(&mut self, node_id: &str) -> bool {
        self.run_action(node_id, |actions, path| actions.open_externally(path))
    }

    pub fn reveal_asset(&mut self, node_id: &str) -> bool {
        self.run_action(node_id, |actions, path| actions.reveal(path))
    }

    pub fn save_asset_copy(&mut self, node_id: &str, destination: &Path) -> bool {
        self.run_action(node_id, |actions, path| actions.save_copy(path, destination))
    }

    // Notifications

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
