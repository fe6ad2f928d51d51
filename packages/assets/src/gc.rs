use crate::error::AssetResult;
use crate::naming::asset_file_name;
use crate::store::{asset_path_of, AssetStore};
use jotter_common::collect_where;
use jotter_model::EditorNode;
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

/// Outcome of an orphan sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcReport {
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}

impl GcReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// File names under `assets/` referenced anywhere in the tree
pub fn referenced_assets(nodes: &[EditorNode]) -> BTreeSet<String> {
    collect_where(nodes, &|node: &EditorNode| node.asset_path().is_some())
        .into_iter()
        .filter_map(|node| node.asset_path().and_then(asset_file_name))
        .map(str::to_string)
        .collect()
}

/// Remove every stored asset the tree no longer references.
///
/// Best-effort: a failed removal is logged and recorded, and the sweep
/// carries on. Only a failure to list the store aborts it.
#[instrument(skip(store, nodes))]
pub fn collect_garbage<S: AssetStore + ?Sized>(store: &S, nodes: &[EditorNode]) -> AssetResult<GcReport> {
    let referenced = referenced_assets(nodes);
    let mut report = GcReport::default();

    for name in store.list_assets()? {
        if referenced.contains(&name) {
            report.kept.push(name);
            continue;
        }

        match store.remove(&asset_path_of(&name)) {
            Ok(()) => report.removed.push(name),
            Err(e) => {
                warn!(asset = %name, error = %e, "Failed to remove orphaned asset");
                report.failed.push(name);
            }
        }
    }

    if !report.removed.is_empty() || !report.failed.is_empty() {
        info!(
            kept = report.kept.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Asset sweep complete"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAssetStore;

    #[test]
    fn test_referenced_assets_includes_nested_folds() {
        let nodes = vec![
            EditorNode::image("i1", "", Some("assets/a.png".to_string())),
            EditorNode::fold(
                "f1",
                vec![EditorNode::file("x", "", None, Some("assets/doc.pdf".to_string()))],
            ),
            EditorNode::image("i2", "https://example.com/remote.png", None),
        ];
        let names: Vec<_> = referenced_assets(&nodes).into_iter().collect();
        assert_eq!(names, vec!["a.png".to_string(), "doc.pdf".to_string()]);
    }

    #[test]
    fn test_failed_removal_does_not_abort_sweep() {
        let store = MemoryAssetStore::new();
        store.add_file("a.png", b"a");
        store.add_file("b.png", b"b");
        store.add_file("c.png", b"c");
        store.fail_removal_of("b.png");

        let nodes = vec![EditorNode::image("i1", "", Some("assets/a.png".to_string()))];
        let report = collect_garbage(&store, &nodes).unwrap();

        assert_eq!(report.kept, vec!["a.png"]);
        assert_eq!(report.removed, vec!["c.png"]);
        assert_eq!(report.failed, vec!["b.png"]);
        assert!(!report.is_clean());
    }
}
