//! # Selection & Insertion
//!
//! Tracks where the user is in the document and decides where inserted
//! content lands.
//!
//! The live selection disappears whenever focus leaves the editable surface
//! (a toolbar click, a file dialog), so the engine keeps two fallbacks:
//!
//! - a **saved selection**, captured explicitly before focus moves to a
//!   toolbar control and restored before a formatting command runs
//! - the **last root index**, the top-level block the cursor was last in,
//!   which survives blur
//!
//! ## Insertion rules
//!
//! ```text
//! anchor inside a fold        → insert inside that fold's content
//! anchor in an empty block    → replace the empty block
//! anchor in a non-empty block → insert after it
//! no anchor, last root index  → same rules on that root block
//! nothing known               → append at the end of the document
//! ```

use jotter_common::{find_node, locate, path_to, root_index_of, Location};
use jotter_model::{EditorNode, NodeKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mutations::Mutation;
use crate::text_ops::inline_len;

/// A collapsed cursor position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caret {
    /// Inside a text-bearing block at a character offset
    Text { block_id: String, offset: usize },

    /// Inside the non-editable core of an atomic unit
    AtomicCore { node_id: String },

    /// In the trailing position right after an atomic unit
    AfterAtomic { node_id: String },

    /// The whole atomic unit is selected
    AtomicSelected { node_id: String },

    /// At the end of a fold's content
    FoldContentEnd { fold_id: String },
}

impl Caret {
    pub fn text(block_id: impl Into<String>, offset: usize) -> Self {
        Caret::Text {
            block_id: block_id.into(),
            offset,
        }
    }

    pub fn node_id(&self) -> &str {
        match self {
            Caret::Text { block_id, .. } => block_id,
            Caret::AtomicCore { node_id }
            | Caret::AfterAtomic { node_id }
            | Caret::AtomicSelected { node_id } => node_id,
            Caret::FoldContentEnd { fold_id } => fold_id,
        }
    }
}

/// A character range inside one text block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub block_id: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    Caret(Caret),
    Range(TextRange),
}

impl Selection {
    pub fn node_id(&self) -> &str {
        match self {
            Selection::Caret(caret) => caret.node_id(),
            Selection::Range(range) => &range.block_id,
        }
    }

    /// Collapse to a caret at the range end
    pub fn caret(&self) -> Caret {
        match self {
            Selection::Caret(caret) => caret.clone(),
            Selection::Range(range) => Caret::text(range.block_id.clone(), range.end),
        }
    }
}

/// Where the cursor was when an operation started. Captured before an
/// asynchronous import so the result lands where the user asked for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertionPoint {
    pub anchor_id: Option<String>,
    pub root_index: Option<usize>,
    /// Fold whose content end held the caret
    pub fold_end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionPlan {
    /// Replace the empty block at this location
    Replace(Location),
    /// Insert after the block at this location
    After(Location),
    /// Insert exactly at this location
    At(Location),
    /// Append at the end of the document
    Append,
}

impl InsertionPlan {
    pub fn to_mutations(&self, nodes: &[EditorNode], new_nodes: Vec<EditorNode>) -> Vec<Mutation> {
        match self {
            InsertionPlan::Replace(location) => vec![
                Mutation::RemoveRange {
                    parent_id: location.parent_id.clone(),
                    index: location.index,
                    count: 1,
                },
                Mutation::InsertNodes {
                    parent_id: location.parent_id.clone(),
                    index: location.index,
                    nodes: new_nodes,
                },
            ],
            InsertionPlan::After(location) => vec![Mutation::InsertNodes {
                parent_id: location.parent_id.clone(),
                index: location.index + 1,
                nodes: new_nodes,
            }],
            InsertionPlan::At(location) => vec![Mutation::InsertNodes {
                parent_id: location.parent_id.clone(),
                index: location.index,
                nodes: new_nodes,
            }],
            InsertionPlan::Append => vec![Mutation::InsertNodes {
                parent_id: None,
                index: nodes.len(),
                nodes: new_nodes,
            }],
        }
    }
}

/// Decide where new blocks go for a captured insertion point
pub fn plan_insertion(point: &InsertionPoint, nodes: &[EditorNode]) -> InsertionPlan {
    if let Some(fold_id) = point.fold_end.as_deref() {
        if let Some(fold @ EditorNode::Fold { .. }) = find_node(nodes, fold_id) {
            let len = fold.children().map_or(0, Vec::len);
            return InsertionPlan::At(Location::child_of(fold_id, len));
        }
    }

    if let Some(anchor) = point.anchor_id.as_deref() {
        if let Some(target) = block_level_target(nodes, anchor) {
            return plan_at(nodes, target);
        }
    }

    if let Some(root) = point.root_index.and_then(|i| nodes.get(i)) {
        if let Some(id) = root.id() {
            return plan_at(nodes, id);
        }
    }

    InsertionPlan::Append
}

/// The ancestor of `anchor` that sits directly in the document root or a
/// fold's content, where root-level blocks may be inserted
fn block_level_target<'a>(nodes: &'a [EditorNode], anchor: &str) -> Option<&'a str> {
    let path = path_to(nodes, anchor)?;
    let k = (0..path.len())
        .rev()
        .find(|&k| k == 0 || path[k - 1].kind() == NodeKind::Fold)?;
    path[k].id()
}

fn plan_at(nodes: &[EditorNode], id: &str) -> InsertionPlan {
    let (Some(node), Some(location)) = (find_node(nodes, id), locate(nodes, id)) else {
        return InsertionPlan::Append;
    };

    let replaceable = matches!(
        node.kind(),
        NodeKind::Paragraph | NodeKind::Heading1 | NodeKind::Heading2
    ) && node.is_empty_block();

    if replaceable {
        InsertionPlan::Replace(location)
    } else {
        InsertionPlan::After(location)
    }
}

/// Caret at the start of a block, descending into lists and folds
pub fn caret_at_start(node: &EditorNode) -> Option<Caret> {
    let id = node.id()?;
    match node.kind() {
        NodeKind::Fold => node
            .children()
            .and_then(|c| c.first())
            .and_then(caret_at_start)
            .or_else(|| Some(Caret::FoldContentEnd {
                fold_id: id.to_string(),
            })),
        NodeKind::List | NodeKind::TaskList => node.children()?.first().and_then(caret_at_start),
        k if k.is_text_block() => Some(Caret::text(id, 0)),
        _ => Some(Caret::AtomicCore {
            node_id: id.to_string(),
        }),
    }
}

/// Caret at the end of a block, descending into lists
pub fn caret_at_end(node: &EditorNode) -> Option<Caret> {
    let id = node.id()?;
    match node.kind() {
        NodeKind::Fold => Some(Caret::FoldContentEnd {
            fold_id: id.to_string(),
        }),
        NodeKind::List | NodeKind::TaskList => node.children()?.last().and_then(caret_at_end),
        k if k.is_text_block() => {
            let len = node.children().map_or(0, |c| inline_len(c));
            Some(Caret::text(id, len))
        }
        _ => Some(Caret::AfterAtomic {
            node_id: id.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    current: Option<Selection>,
    saved: Option<Selection>,
    last_root_index: Option<usize>,
    focused: bool,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    pub fn caret(&self) -> Option<Caret> {
        self.current.as_ref().map(Selection::caret)
    }

    pub fn saved(&self) -> Option<&Selection> {
        self.saved.as_ref()
    }

    pub fn last_root_index(&self) -> Option<usize> {
        self.last_root_index
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set(&mut self, selection: Selection, nodes: &[EditorNode]) {
        if let Some(index) = root_index_of(nodes, selection.node_id()) {
            self.last_root_index = Some(index);
        }
        self.current = Some(selection);
        self.focused = true;
    }

    pub fn set_caret(&mut self, caret: Caret, nodes: &[EditorNode]) {
        self.set(Selection::Caret(caret), nodes);
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Focus left the surface; the live selection is gone but the last root
    /// index survives
    pub fn blur(&mut self) {
        self.focused = false;
        self.current = None;
    }

    /// Snapshot the live selection before focus moves to a toolbar control.
    /// A missing live selection keeps the previous snapshot.
    pub fn save(&mut self) {
        if let Some(current) = &self.current {
            self.saved = Some(current.clone());
        }
    }

    /// Reinstate the saved selection if its block still exists
    pub fn restore(&mut self, nodes: &[EditorNode]) -> bool {
        match self.saved.clone() {
            Some(saved) if find_node(nodes, saved.node_id()).is_some() => {
                self.set(saved, nodes);
                true
            }
            _ => false,
        }
    }

    pub fn capture(&self) -> InsertionPoint {
        InsertionPoint {
            anchor_id: self.current.as_ref().map(|s| s.node_id().to_string()),
            root_index: self.last_root_index,
            fold_end: match &self.current {
                Some(Selection::Caret(Caret::FoldContentEnd { fold_id })) => Some(fold_id.clone()),
                _ => None,
            },
        }
    }

    pub fn plan(&self, nodes: &[EditorNode]) -> InsertionPlan {
        plan_insertion(&self.capture(), nodes)
    }

    /// Drop references to blocks that no longer exist
    pub fn reconcile(&mut self, nodes: &[EditorNode]) {
        if let Some(current) = &self.current {
            if find_node(nodes, current.node_id()).is_none() {
                debug!(node = current.node_id(), "Selection target removed");
                self.current = None;
            }
        }
        if let Some(saved) = &self.saved {
            if find_node(nodes, saved.node_id()).is_none() {
                self.saved = None;
            }
        }
        self.last_root_index = match self.last_root_index {
            _ if nodes.is_empty() => None,
            Some(i) => Some(i.min(nodes.len() - 1)),
            None => None,
        };
    }

    /// Put the caret after freshly inserted content
    pub fn after_insert(&mut self, inserted: &[EditorNode], nodes: &[EditorNode]) {
        if let Some(caret) = inserted.last().and_then(caret_at_end) {
            self.set_caret(caret, nodes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Vec<EditorNode> {
        vec![
            EditorNode::paragraph("p1", vec![EditorNode::text("one")]),
            EditorNode::empty_paragraph("p2"),
            EditorNode::fold("f1", vec![EditorNode::paragraph("p3", vec![EditorNode::text("in")])]),
            EditorNode::List {
                id: "l1".to_string(),
                ordered: true,
                children: vec![EditorNode::ListItem {
                    id: "li1".to_string(),
                    children: vec![EditorNode::text("item")],
                }],
            },
        ]
    }

    fn point(anchor: Option<&str>, root_index: Option<usize>) -> InsertionPoint {
        InsertionPoint {
            anchor_id: anchor.map(str::to_string),
            root_index,
            fold_end: None,
        }
    }

    #[test]
    fn test_plan_after_non_empty_block() {
        assert_eq!(
            plan_insertion(&point(Some("p1"), None), &doc()),
            InsertionPlan::After(Location::root(0))
        );
    }

    #[test]
    fn test_plan_replaces_empty_block() {
        assert_eq!(
            plan_insertion(&point(Some("p2"), None), &doc()),
            InsertionPlan::Replace(Location::root(1))
        );
    }

    #[test]
    fn test_plan_nests_inside_fold() {
        assert_eq!(
            plan_insertion(&point(Some("p3"), None), &doc()),
            InsertionPlan::After(Location::child_of("f1", 0))
        );
    }

    #[test]
    fn test_plan_at_fold_content_end_appends_into_fold() {
        let nodes = doc();
        let mut engine = SelectionEngine::new();
        engine.set_caret(
            Caret::FoldContentEnd {
                fold_id: "f1".to_string(),
            },
            &nodes,
        );

        let plan = engine.plan(&nodes);
        assert_eq!(plan, InsertionPlan::At(Location::child_of("f1", 1)));
        assert_eq!(
            plan.to_mutations(&nodes, vec![EditorNode::empty_paragraph("n1")]),
            vec![Mutation::InsertNodes {
                parent_id: Some("f1".to_string()),
                index: 1,
                nodes: vec![EditorNode::empty_paragraph("n1")],
            }]
        );
    }

    #[test]
    fn test_plan_list_item_goes_after_list() {
        assert_eq!(
            plan_insertion(&point(Some("li1"), None), &doc()),
            InsertionPlan::After(Location::root(3))
        );
    }

    #[test]
    fn test_blur_falls_back_to_last_root_index() {
        let nodes = doc();
        let mut engine = SelectionEngine::new();
        engine.set_caret(Caret::text("p3", 1), &nodes);
        assert_eq!(engine.last_root_index(), Some(2));

        engine.blur();
        assert!(engine.current().is_none());
        assert_eq!(
            engine.plan(&nodes),
            InsertionPlan::After(Location::root(2))
        );
    }

    #[test]
    fn test_nothing_known_appends() {
        assert_eq!(SelectionEngine::new().plan(&doc()), InsertionPlan::Append);
    }

    #[test]
    fn test_save_and_restore() {
        let nodes = doc();
        let mut engine = SelectionEngine::new();
        let range = Selection::Range(TextRange {
            block_id: "p1".to_string(),
            start: 0,
            end: 3,
        });
        engine.set(range.clone(), &nodes);
        engine.save();
        engine.blur();

        assert!(engine.restore(&nodes));
        assert_eq!(engine.current(), Some(&range));

        engine.reconcile(&nodes[1..]);
        assert!(engine.current().is_none());
        assert!(!engine.restore(&nodes[1..]));
    }
}
