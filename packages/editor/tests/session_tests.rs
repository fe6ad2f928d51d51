//! Session lifecycle: autosave, external changes, attachments and asset actions

use jotter_assets::{AssetStore, MemoryAssetStore};
use jotter_editor::{
    AssetActions, Caret, EditEvent, EditSession, EditorConfig, HostError, MemorySink, NotificationLevel,
    SaveOutcome,
};
use jotter_model::{EditorNode, IdGenerator};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const TWO_PARAGRAPHS: &str = r#"[
    {"type":"paragraph","id":"p1","children":[{"type":"text","value":"a"}]},
    {"type":"paragraph","id":"p2","children":[{"type":"text","value":"b"}]}
]"#;

fn session(source: &str) -> EditSession<MemoryAssetStore, MemorySink> {
    session_with(source, MemoryAssetStore::new(), MemorySink::default())
}

fn session_with(source: &str, store: MemoryAssetStore, sink: MemorySink) -> EditSession<MemoryAssetStore, MemorySink> {
    EditSession::open_with_ids(source, IdGenerator::from_seed("s"), store, sink, EditorConfig::default())
}

fn type_at(session: &mut EditSession<MemoryAssetStore, MemorySink>, block: &str, text: &str, now: Instant) {
    session.editor_mut().set_caret(Caret::text(block, 0));
    assert!(session.handle_edit(EditEvent::Input(text.to_string()), now));
}

#[test]
fn test_autosave_fires_after_quiet_period() {
    let mut session = session(TWO_PARAGRAPHS);
    let start = Instant::now();

    type_at(&mut session, "p1", "x", start);
    assert!(session.is_dirty());
    assert!(session.tick(start + Duration::from_millis(1000)).is_none());

    let outcome = session.tick(start + Duration::from_millis(1600));
    assert_eq!(outcome, Some(SaveOutcome::Saved { removed_assets: 0 }));
    assert_eq!(session.sink().writes.len(), 1);
    assert!(!session.is_dirty());
    assert!(session.last_saved_at().is_some());
}

#[test]
fn test_further_edits_push_autosave_back() {
    let mut session = session(TWO_PARAGRAPHS);
    let start = Instant::now();

    type_at(&mut session, "p1", "x", start);
    type_at(&mut session, "p2", "y", start + Duration::from_millis(1000));

    assert!(session.tick(start + Duration::from_millis(1600)).is_none());
    assert!(session.tick(start + Duration::from_millis(2600)).is_some());
    assert_eq!(session.sink().writes.len(), 1);
}

#[test]
fn test_explicit_save_cancels_pending_autosave() {
    let mut session = session(TWO_PARAGRAPHS);
    let start = Instant::now();

    type_at(&mut session, "p1", "x", start);
    assert!(matches!(session.save(), SaveOutcome::Saved { .. }));
    assert!(!session.autosave().is_pending());
    assert!(session.tick(start + Duration::from_secs(5)).is_none());
}

#[test]
fn test_fresh_session_is_clean() {
    let store = MemoryAssetStore::new();
    store.add_file("doc.pdf", b"12345");
    let session = session_with(
        r#"[{"type":"file","id":"f1","url":"","fileName":"doc.pdf","assetPath":"assets/doc.pdf"}]"#,
        store,
        MemorySink::default(),
    );

    assert!(!session.is_dirty());
    match session.editor().document().find("f1") {
        Some(EditorNode::File { file_size, url, .. }) => {
            assert_eq!(*file_size, Some(5));
            assert_eq!(url, "asset://assets/doc.pdf");
        }
        other => panic!("expected file node, got {:?}", other),
    }
}

#[test]
fn test_external_change_respects_unsaved_edits() {
    let mut session = session(TWO_PARAGRAPHS);
    let replacement = r#"[{"type":"paragraph","id":"z","children":[{"type":"text","value":"remote"}]}]"#;

    type_at(&mut session, "p1", "x", Instant::now());
    assert!(!session.external_change(replacement));
    assert_eq!(session.editor().nodes()[0].plain_text(), "xa");

    session.save();
    assert!(session.external_change(replacement));
    assert_eq!(session.editor().nodes().len(), 1);
    assert_eq!(session.editor().nodes()[0].plain_text(), "remote");
    assert!(!session.is_dirty());
    assert!(!session.editor().can_undo());
}

#[test]
fn test_failed_write_keeps_document_dirty() {
    let sink = MemorySink {
        fail: true,
        ..Default::default()
    };
    let mut session = session_with(TWO_PARAGRAPHS, MemoryAssetStore::new(), sink);

    type_at(&mut session, "p1", "x", Instant::now());
    assert_eq!(session.save(), SaveOutcome::Failed);
    assert!(session.is_dirty());
    assert!(session.last_saved_at().is_none());

    let notifications = session.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert!(notifications[0].message.contains("disk full"));
}

#[test]
fn test_failed_attach_reports_and_leaves_document_alone() {
    let mut session = session(TWO_PARAGRAPHS);
    session.store().set_fail_writes(true);

    assert!(session.attach_bytes("photo.png", b"png", Instant::now()).is_none());
    assert_eq!(session.editor().nodes().len(), 2);
    assert!(!session.is_dirty());
    assert_eq!(session.notifications()[0].level, NotificationLevel::Error);
}

#[tokio::test]
async fn test_attach_file_lands_after_caret_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, b"%PDF-1.7").unwrap();

    let mut session = session(TWO_PARAGRAPHS);
    session.editor_mut().set_caret(Caret::text("p1", 1));

    let imported = session.attach_file(&path, Instant::now()).await.unwrap();

    let nodes = session.editor().nodes();
    assert_eq!(nodes.len(), 3);
    match &nodes[1] {
        EditorNode::File {
            file_name,
            file_size,
            asset_path,
            ..
        } => {
            assert_eq!(file_name.as_deref(), Some("report.pdf"));
            assert_eq!(*file_size, Some(8));
            assert_eq!(asset_path.as_deref(), Some(imported.asset_path.as_str()));
        }
        other => panic!("expected file node, got {:?}", other),
    }
    assert!(session.store().exists(&imported.asset_path));
    assert!(session.autosave().is_pending());
}

#[tokio::test]
async fn test_attach_missing_file_reports() {
    let mut session = session(TWO_PARAGRAPHS);
    assert!(session.attach_file("/no/such/file.png", Instant::now()).await.is_none());
    assert_eq!(session.notifications().len(), 1);
}

#[derive(Clone, Default)]
struct RecordingActions {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingActions {
    fn record(&self, call: String) -> Result<(), HostError> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl AssetActions for RecordingActions {
    fn open_externally(&self, asset_path: &str) -> Result<(), HostError> {
        self.record(format!("open {}", asset_path))
    }

    fn reveal(&self, asset_path: &str) -> Result<(), HostError> {
        self.record(format!("reveal {}", asset_path))
    }

    fn save_copy(&self, asset_path: &str, destination: &Path) -> Result<(), HostError> {
        if destination.as_os_str().is_empty() {
            return Err("no destination".into());
        }
        self.record(format!("copy {} {}", asset_path, destination.display()))
    }
}

const WITH_IMAGE: &str = r#"[
    {"type":"paragraph","id":"p1"},
    {"type":"image","id":"i1","url":"","assetPath":"assets/cat.png"}
]"#;

#[test]
fn test_asset_actions_receive_asset_path() {
    let actions = RecordingActions::default();
    let mut session = session(WITH_IMAGE).with_actions(Box::new(actions.clone()));

    assert!(session.open_asset("i1"));
    assert!(session.reveal_asset("i1"));
    assert!(session.save_asset_copy("i1", Path::new("/tmp/out.png")));
    assert!(!session.save_asset_copy("i1", Path::new("")));

    assert_eq!(
        *actions.calls.lock().unwrap(),
        vec![
            "open assets/cat.png".to_string(),
            "reveal assets/cat.png".to_string(),
            "copy assets/cat.png /tmp/out.png".to_string(),
        ]
    );
    assert_eq!(session.notifications().len(), 1);
}

#[test]
fn test_asset_actions_report_missing_targets() {
    let mut session = session(WITH_IMAGE);
    assert!(!session.open_asset("i1"));
    assert!(!session.open_asset("p1"));

    let messages: Vec<_> = session.take_notifications().into_iter().map(|n| n.message).collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("not available"));
    assert!(messages[1].contains("p1"));
}

#[test]
fn test_syncing_unchanged_surface_is_not_an_edit() {
    let store = MemoryAssetStore::new();
    store.add_file("x.pdf", b"0123456789");
    let mut session = session_with(
        r#"[
            {"type":"file","id":"f1","url":"","fileName":"x.pdf","assetPath":"assets/x.pdf"},
            {"type":"paragraph","id":"p1"}
        ]"#,
        store,
        MemorySink::default(),
    );

    let surface = session.editor().surface().clone();
    assert!(!session.sync_from_surface(&surface, Instant::now()));

    assert!(!session.editor().can_undo());
    assert!(!session.autosave().is_pending());
    assert!(!session.is_dirty());
    assert!(matches!(
        session.editor().document().find("f1"),
        Some(EditorNode::File { file_size: Some(10), .. })
    ));
}

#[test]
fn test_sync_after_attach_keeps_file_size() {
    let mut session = session(TWO_PARAGRAPHS);
    session.editor_mut().set_caret(Caret::text("p2", 1));
    let imported = session.attach_bytes("report.pdf", b"%PDF-1.7", Instant::now()).unwrap();
    session.save();

    let surface = session.editor().surface().clone();
    assert!(!session.sync_from_surface(&surface, Instant::now()));
    let file = session
        .editor()
        .nodes()
        .iter()
        .find(|n| n.asset_path() == Some(imported.asset_path.as_str()));
    assert!(matches!(file, Some(EditorNode::File { file_size: Some(8), .. })));
}
