//! # Persisted Document Codec
//!
//! The persisted format is a JSON array of [`EditorNode`]s. Loading is
//! forgiving: invalid JSON or a non-array root yields an empty document, and
//! array elements that fail to decode are skipped rather than failing the
//! whole load. Every loaded tree is normalized so the model invariants hold:
//!
//! - the root is a non-empty sequence of blocks (loose inline content is
//!   wrapped into paragraphs, an empty document becomes one empty paragraph)
//! - every block has a unique id
//! - list and task list children are items of the matching kind
//! - image widths are clamped into `10..=100`
//! - folds nested deeper than [`MAX_FOLD_DEPTH`] are unwrapped into their parent

use crate::error::{ModelError, ModelResult};
use crate::id_generator::IdGenerator;
use crate::node::{clamp_width, EditorNode, NodeKind, DEFAULT_CODE_LANGUAGE, MAX_FOLD_DEPTH};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Load a persisted document, falling back to an empty document on any
/// top-level decoding failure
pub fn load_document(source: &str, ids: &mut IdGenerator) -> Vec<EditorNode> {
    load_document_within(source, ids, MAX_FOLD_DEPTH)
}

/// [`load_document`] with an explicit fold nesting limit
#[instrument(skip(source, ids), fields(len = source.len()))]
pub fn load_document_within(
    source: &str,
    ids: &mut IdGenerator,
    max_fold_depth: usize,
) -> Vec<EditorNode> {
    match parse_nodes(source) {
        Ok(nodes) => normalize_document_within(nodes, ids, max_fold_depth),
        Err(e) => {
            warn!(error = %e, "Malformed document, starting empty");
            vec![EditorNode::empty_paragraph(ids.new_id())]
        }
    }
}

/// Decode the raw node list without normalizing it
pub fn parse_nodes(source: &str) -> ModelResult<Vec<EditorNode>> {
    let value: Value = serde_json::from_str(source)?;
    let items = match value {
        Value::Array(items) => items,
        other => return Err(ModelError::not_an_array(&other)),
    };

    let mut nodes = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<EditorNode>(item) {
            Ok(node) => nodes.push(node),
            Err(e) => debug!(index, error = %e, "Skipping undecodable node"),
        }
    }

    Ok(nodes)
}

/// Serialize a document to its persisted form. `fileSize` is never written.
pub fn serialize_document(nodes: &[EditorNode]) -> ModelResult<String> {
    Ok(serde_json::to_string(nodes)?)
}

/// Bring an arbitrary node list into a valid document shape
pub fn normalize_document(nodes: Vec<EditorNode>, ids: &mut IdGenerator) -> Vec<EditorNode> {
    normalize_document_within(nodes, ids, MAX_FOLD_DEPTH)
}

/// Normalize a node list, unwrapping any fold nested deeper than
/// `max_fold_depth`. An unwrapped fold is replaced by its children in place.
pub fn normalize_document_within(
    nodes: Vec<EditorNode>,
    ids: &mut IdGenerator,
    max_fold_depth: usize,
) -> Vec<EditorNode> {
    for node in &nodes {
        reserve_ids(node, ids);
    }

    let mut normalizer = Normalizer {
        ids,
        seen: HashSet::new(),
        max_fold_depth,
    };
    let mut blocks = normalizer.blocks(nodes, 0);

    if blocks.is_empty() {
        blocks.push(EditorNode::empty_paragraph(normalizer.ids.new_id()));
    }

    blocks
}

fn reserve_ids(node: &EditorNode, ids: &mut IdGenerator) {
    if let Some(id) = node.id() {
        ids.reserve(id);
    }
    if let Some(children) = node.children() {
        for child in children {
            reserve_ids(child, ids);
        }
    }
}

struct Normalizer<'a> {
    ids: &'a mut IdGenerator,
    seen: HashSet<String>,
    max_fold_depth: usize,
}

impl Normalizer<'_> {
    /// `folds` is the number of folds enclosing this sequence
    fn blocks(&mut self, nodes: Vec<EditorNode>, folds: usize) -> Vec<EditorNode> {
        let mut out = Vec::with_capacity(nodes.len());
        let mut loose = Vec::new();

        for mut node in nodes {
            let kind = node.kind();
            if kind.is_inline() {
                loose.push(node);
                continue;
            }

            self.flush_loose(&mut loose, &mut out, folds);

            let node = match kind {
                NodeKind::ListItem => EditorNode::List {
                    id: String::new(),
                    ordered: false,
                    children: vec![node],
                },
                NodeKind::TaskItem => EditorNode::TaskList {
                    id: String::new(),
                    children: vec![node],
                },
                NodeKind::Fold if folds >= self.max_fold_depth => {
                    debug!(folds, "Unwrapping fold nested too deep");
                    let children = node.children_mut().map(std::mem::take).unwrap_or_default();
                    out.extend(self.blocks(children, folds));
                    continue;
                }
                _ => node,
            };
            out.push(self.node(node, folds));
        }

        self.flush_loose(&mut loose, &mut out, folds);
        out
    }

    fn flush_loose(&mut self, loose: &mut Vec<EditorNode>, out: &mut Vec<EditorNode>, folds: usize) {
        if loose.is_empty() {
            return;
        }
        let paragraph = EditorNode::paragraph(String::new(), std::mem::take(loose));
        out.push(self.node(paragraph, folds));
    }

    fn node(&mut self, mut node: EditorNode, folds: usize) -> EditorNode {
        if let Some(id) = node.id_mut() {
            if id.is_empty() || !self.seen.insert(id.clone()) {
                *id = self.ids.new_id();
                self.seen.insert(id.clone());
            }
        }

        match &mut node {
            EditorNode::Image { width_percent, .. } => {
                *width_percent = clamp_width(*width_percent);
            }
            EditorNode::Code { language, .. } if language.trim().is_empty() => {
                *language = DEFAULT_CODE_LANGUAGE.to_string();
            }
            _ => {}
        }

        let kind = node.kind();
        if let Some(children) = node.children_mut() {
            let taken = std::mem::take(children);
            *children = match kind {
                NodeKind::List => self.items(taken, NodeKind::ListItem, folds),
                NodeKind::TaskList => self.items(taken, NodeKind::TaskItem, folds),
                NodeKind::Fold => self.blocks(taken, folds + 1),
                _ => taken
                    .into_iter()
                    .map(|child| self.node(child, folds))
                    .collect(),
            };
        }

        node
    }

    fn items(&mut self, children: Vec<EditorNode>, item_kind: NodeKind, folds: usize) -> Vec<EditorNode> {
        children
            .into_iter()
            .map(|child| {
                let child = if child.kind() == item_kind {
                    child
                } else if item_kind == NodeKind::TaskItem {
                    EditorNode::TaskItem {
                        id: String::new(),
                        checked: false,
                        children: vec![child],
                    }
                } else {
                    EditorNode::ListItem {
                        id: String::new(),
                        children: vec![child],
                    }
                };
                self.node(child, folds)
            })
            .collect()
    }
}
