use jotter_assets::*;
use jotter_model::EditorNode;

#[test]
fn test_orphan_gc_removes_unreferenced_only() {
    let store = MemoryAssetStore::new();
    store.add_file("a.png", b"a");
    store.add_file("b.png", b"b");

    let nodes = vec![EditorNode::image("i1", "asset://a", Some("assets/a.png".to_string()))];
    let report = collect_garbage(&store, &nodes).unwrap();

    assert_eq!(report.removed, vec!["b.png".to_string()]);
    assert_eq!(store.file_names(), vec!["a.png".to_string()]);
}

#[test]
fn test_dedup_then_gc_keeps_shared_asset() {
    let store = MemoryAssetStore::new();
    let importer = AssetImporter::new(&store);

    let first = importer.import_bytes("one.png", b"same bytes").unwrap();
    let second = importer.import_bytes("two.png", b"same bytes").unwrap();
    assert_eq!(first.asset_path, second.asset_path);

    // Only the second reference survives in the tree
    let nodes = vec![second.to_node("i2", "asset://two")];
    let report = collect_garbage(&store, &nodes).unwrap();
    assert!(report.removed.is_empty());
    assert_eq!(report.kept.len(), 1);
}

#[test]
fn test_gc_on_empty_document_clears_store() {
    let store = MemoryAssetStore::new();
    store.add_file("x.bin", b"x");
    let report = collect_garbage(&store, &[EditorNode::empty_paragraph("p")]).unwrap();
    assert_eq!(report.removed, vec!["x.bin".to_string()]);
    assert!(store.file_names().is_empty());
}
