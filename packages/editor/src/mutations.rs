//! # Document Mutations
//!
//! Every change to the document goes through a [`Mutation`]. Mutations are
//! validated against the structural rules before they touch the tree, and
//! each one can produce its exact inverse from the pre-mutation state, which
//! is what the undo log records.
//!
//! ## Structural rules
//!
//! - the root and fold contents hold root-level blocks only
//! - lists hold list items, task lists hold task items
//! - text blocks and inline wrappers hold inline content only
//! - images, files, code blocks and text runs hold nothing
//! - folds never nest deeper than [`Constraints::max_fold_depth`]
//! - block ids are unique across the document

use jotter_common::{
    children_of, children_of_mut, collect_where, find_node, find_node_mut, fold_depth_of,
    fold_nesting, insert_children, locate, remove_node, replace_node,
};
use jotter_model::{
    clamp_width, Align, EditorNode, NodeKind, DEFAULT_CODE_LANGUAGE, MAX_FOLD_DEPTH,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Semantic document changes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert blocks (or inline nodes) under a parent at index
    InsertNodes {
        parent_id: Option<String>,
        index: usize,
        nodes: Vec<EditorNode>,
    },

    /// Remove `count` consecutive children starting at `index`
    RemoveRange {
        parent_id: Option<String>,
        index: usize,
        count: usize,
    },

    /// Remove a block and everything inside it
    RemoveNode { node_id: String },

    /// Swap a block for another (kind changes, list wrapping)
    ReplaceNode { node_id: String, node: EditorNode },

    /// Replace a node's children wholesale (inline text edits)
    SetChildren {
        node_id: String,
        children: Vec<EditorNode>,
    },

    SetChecked { node_id: String, checked: bool },

    SetFolded { node_id: String, folded: bool },

    SetCodeLanguage { node_id: String, language: String },

    SetCodeContent { node_id: String, content: String },

    SetImageWidth { node_id: String, width_percent: u32 },

    SetAlign { node_id: String, align: Align },

    /// Replace the whole document (surface resync)
    ReplaceDocument { nodes: Vec<EditorNode> },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Node {node_id} is not {expected}")]
    WrongKind {
        node_id: String,
        expected: &'static str,
    },

    #[error("Duplicate block id: {0}")]
    DuplicateId(String),

    #[error("Folds nested {depth} deep (max {max})")]
    FoldTooDeep { depth: usize, max: usize },

    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

pub type MutationResult<T> = Result<T, MutationError>;

/// Document-wide limits checked by validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraints {
    pub max_fold_depth: usize,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_fold_depth: MAX_FOLD_DEPTH,
        }
    }
}

impl Mutation {
    /// Short label used for undo descriptions and logging
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertNodes { .. } => "insert",
            Mutation::RemoveRange { .. } => "remove range",
            Mutation::RemoveNode { .. } => "remove",
            Mutation::ReplaceNode { .. } => "replace",
            Mutation::SetChildren { .. } => "edit text",
            Mutation::SetChecked { .. } => "toggle checkbox",
            Mutation::SetFolded { .. } => "toggle fold",
            Mutation::SetCodeLanguage { .. } => "set language",
            Mutation::SetCodeContent { .. } => "edit code",
            Mutation::SetImageWidth { .. } => "resize image",
            Mutation::SetAlign { .. } => "align",
            Mutation::ReplaceDocument { .. } => "sync",
        }
    }

    /// Whether this mutation can leave a container without children
    pub fn removes_content(&self) -> bool {
        matches!(
            self,
            Mutation::RemoveRange { .. }
                | Mutation::RemoveNode { .. }
                | Mutation::ReplaceNode { .. }
                | Mutation::SetChildren { .. }
                | Mutation::ReplaceDocument { .. }
        )
    }

    /// Check the mutation against the current tree without changing it
    pub fn validate(&self, nodes: &[EditorNode], constraints: &Constraints) -> MutationResult<()> {
        match self {
            Mutation::InsertNodes {
                parent_id,
                index,
                nodes: new_nodes,
            } => {
                let parent = resolve_parent(nodes, parent_id.as_deref())?;
                let len = children_of(nodes, parent_id.as_deref()).map_or(0, |c| c.len());
                if *index > len {
                    return Err(MutationError::IndexOutOfBounds { index: *index, len });
                }
                for node in new_nodes {
                    check_child(parent, node)?;
                }
                check_fold_depth(nodes, parent_id.as_deref(), new_nodes, constraints)?;
                check_ids(nodes, new_nodes, &[])
            }

            Mutation::RemoveRange {
                parent_id,
                index,
                count,
            } => {
                resolve_parent(nodes, parent_id.as_deref())?;
                let len = children_of(nodes, parent_id.as_deref()).map_or(0, |c| c.len());
                if index + count > len {
                    return Err(MutationError::IndexOutOfBounds {
                        index: index + count,
                        len,
                    });
                }
                Ok(())
            }

            Mutation::RemoveNode { node_id } => {
                require(nodes, node_id)?;
                Ok(())
            }

            Mutation::ReplaceNode { node_id, node } => {
                let old = require(nodes, node_id)?;
                let location = locate(nodes, node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                let parent = resolve_parent(nodes, location.parent_id.as_deref())?;
                check_child(parent, node)?;
                let ancestors = location
                    .parent_id
                    .as_deref()
                    .map_or(0, |p| fold_depth_of(nodes, p));
                check_depth(ancestors + fold_nesting(node), constraints)?;
                check_ids(nodes, std::slice::from_ref(node), std::slice::from_ref(old))
            }

            Mutation::SetChildren { node_id, children } => {
                let node = require(nodes, node_id)?;
                for child in children {
                    check_child(Some(node), child)?;
                }
                let ancestors = fold_depth_of(nodes, node_id);
                for child in children {
                    check_depth(ancestors + fold_nesting(child), constraints)?;
                }
                let leaving = node.children().map_or(&[][..], |c| c.as_slice());
                check_ids(nodes, children, leaving)
            }

            Mutation::SetChecked { node_id, .. } => {
                expect_kind(nodes, node_id, NodeKind::TaskItem, "a task item")
            }

            Mutation::SetFolded { node_id, .. } => {
                expect_kind(nodes, node_id, NodeKind::Fold, "a fold")
            }

            Mutation::SetCodeLanguage { node_id, .. } | Mutation::SetCodeContent { node_id, .. } => {
                expect_kind(nodes, node_id, NodeKind::Code, "a code block")
            }

            Mutation::SetImageWidth { node_id, .. } => {
                expect_kind(nodes, node_id, NodeKind::Image, "an image")
            }

            Mutation::SetAlign { node_id, .. } => {
                let node = require(nodes, node_id)?;
                if node.align().is_none() {
                    return Err(MutationError::WrongKind {
                        node_id: node_id.clone(),
                        expected: "alignable",
                    });
                }
                Ok(())
            }

            Mutation::ReplaceDocument { nodes: new_nodes } => {
                if new_nodes.is_empty() {
                    return Err(MutationError::InvalidStructure(
                        "document must hold at least one block".to_string(),
                    ));
                }
                for node in new_nodes {
                    check_child(None, node)?;
                }
                check_fold_depth(&[], None, new_nodes, constraints)?;
                check_ids(&[], new_nodes, &[])
            }
        }
    }

    /// Validate, then apply
    pub fn apply(&self, nodes: &mut Vec<EditorNode>, constraints: &Constraints) -> MutationResult<()> {
        self.validate(nodes, constraints)?;

        match self {
            Mutation::InsertNodes {
                parent_id,
                index,
                nodes: new_nodes,
            } => {
                if insert_children(nodes, parent_id.as_deref(), *index, new_nodes.clone()) {
                    Ok(())
                } else {
                    Err(parent_missing(parent_id.as_deref()))
                }
            }

            Mutation::RemoveRange {
                parent_id,
                index,
                count,
            } => {
                let children = children_of_mut(nodes, parent_id.as_deref())
                    .ok_or_else(|| parent_missing(parent_id.as_deref()))?;
                children.drain(*index..*index + *count);
                Ok(())
            }

            Mutation::RemoveNode { node_id } => remove_node(nodes, node_id)
                .map(|_| ())
                .ok_or_else(|| MutationError::NodeNotFound(node_id.clone())),

            Mutation::ReplaceNode { node_id, node } => replace_node(nodes, node_id, node.clone())
                .map(|_| ())
                .ok_or_else(|| MutationError::NodeNotFound(node_id.clone())),

            Mutation::SetChildren { node_id, children } => {
                let slot = find_node_mut(nodes, node_id)
                    .and_then(|n| n.children_mut())
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                *slot = children.clone();
                Ok(())
            }

            Mutation::SetChecked { node_id, checked } => with_node(nodes, node_id, |node| {
                if let EditorNode::TaskItem { checked: c, .. } = node {
                    *c = *checked;
                }
            }),

            Mutation::SetFolded { node_id, folded } => with_node(nodes, node_id, |node| {
                if let EditorNode::Fold { folded: f, .. } = node {
                    *f = *folded;
                }
            }),

            Mutation::SetCodeLanguage { node_id, language } => with_node(nodes, node_id, |node| {
                if let EditorNode::Code { language: l, .. } = node {
                    let trimmed = language.trim();
                    *l = if trimmed.is_empty() {
                        DEFAULT_CODE_LANGUAGE.to_string()
                    } else {
                        trimmed.to_string()
                    };
                }
            }),

            Mutation::SetCodeContent { node_id, content } => with_node(nodes, node_id, |node| {
                if let EditorNode::Code { content: c, .. } = node {
                    *c = content.clone();
                }
            }),

            Mutation::SetImageWidth {
                node_id,
                width_percent,
            } => with_node(nodes, node_id, |node| {
                if let EditorNode::Image {
                    width_percent: w, ..
                } = node
                {
                    *w = clamp_width(*width_percent);
                }
            }),

            Mutation::SetAlign { node_id, align } => with_node(nodes, node_id, |node| {
                if let Some(a) = node.align_mut() {
                    *a = *align;
                }
            }),

            Mutation::ReplaceDocument { nodes: new_nodes } => {
                *nodes = new_nodes.clone();
                Ok(())
            }
        }
    }

    /// The mutation that undoes this one, computed from the tree as it is
    /// before this mutation is applied
    pub fn to_inverse(&self, nodes: &[EditorNode]) -> MutationResult<Mutation> {
        let inverse = match self {
            Mutation::InsertNodes {
                parent_id,
                index,
                nodes: new_nodes,
            } => {
                let len = children_of(nodes, parent_id.as_deref())
                    .ok_or_else(|| parent_missing(parent_id.as_deref()))?
                    .len();
                Mutation::RemoveRange {
                    parent_id: parent_id.clone(),
                    index: (*index).min(len),
                    count: new_nodes.len(),
                }
            }

            Mutation::RemoveRange {
                parent_id,
                index,
                count,
            } => {
                let children = children_of(nodes, parent_id.as_deref())
                    .ok_or_else(|| parent_missing(parent_id.as_deref()))?;
                let removed = children.get(*index..*index + *count).ok_or(
                    MutationError::IndexOutOfBounds {
                        index: index + count,
                        len: children.len(),
                    },
                )?;
                Mutation::InsertNodes {
                    parent_id: parent_id.clone(),
                    index: *index,
                    nodes: removed.to_vec(),
                }
            }

            Mutation::RemoveNode { node_id } => {
                let node = require(nodes, node_id)?;
                let location = locate(nodes, node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                Mutation::InsertNodes {
                    parent_id: location.parent_id,
                    index: location.index,
                    nodes: vec![node.clone()],
                }
            }

            Mutation::ReplaceNode { node_id, node } => {
                let old = require(nodes, node_id)?;
                let new_id = node
                    .id()
                    .filter(|id| !id.is_empty())
                    .unwrap_or(node_id.as_str());
                Mutation::ReplaceNode {
                    node_id: new_id.to_string(),
                    node: old.clone(),
                }
            }

            Mutation::SetChildren { node_id, .. } => Mutation::SetChildren {
                node_id: node_id.clone(),
                children: require(nodes, node_id)?.children().cloned().unwrap_or_default(),
            },

            Mutation::SetChecked { node_id, .. } => match require(nodes, node_id)? {
                EditorNode::TaskItem { checked, .. } => Mutation::SetChecked {
                    node_id: node_id.clone(),
                    checked: *checked,
                },
                _ => return Err(wrong_kind(node_id, "a task item")),
            },

            Mutation::SetFolded { node_id, .. } => match require(nodes, node_id)? {
                EditorNode::Fold { folded, .. } => Mutation::SetFolded {
                    node_id: node_id.clone(),
                    folded: *folded,
                },
                _ => return Err(wrong_kind(node_id, "a fold")),
            },

            Mutation::SetCodeLanguage { node_id, .. } => match require(nodes, node_id)? {
                EditorNode::Code { language, .. } => Mutation::SetCodeLanguage {
                    node_id: node_id.clone(),
                    language: language.clone(),
                },
                _ => return Err(wrong_kind(node_id, "a code block")),
            },

            Mutation::SetCodeContent { node_id, .. } => match require(nodes, node_id)? {
                EditorNode::Code { content, .. } => Mutation::SetCodeContent {
                    node_id: node_id.clone(),
                    content: content.clone(),
                },
                _ => return Err(wrong_kind(node_id, "a code block")),
            },

            Mutation::SetImageWidth { node_id, .. } => match require(nodes, node_id)? {
                EditorNode::Image { width_percent, .. } => Mutation::SetImageWidth {
                    node_id: node_id.clone(),
                    width_percent: *width_percent,
                },
                _ => return Err(wrong_kind(node_id, "an image")),
            },

            Mutation::SetAlign { node_id, .. } => Mutation::SetAlign {
                node_id: node_id.clone(),
                align: require(nodes, node_id)?
                    .align()
                    .ok_or_else(|| wrong_kind(node_id, "alignable"))?,
            },

            Mutation::ReplaceDocument { .. } => Mutation::ReplaceDocument {
                nodes: nodes.to_vec(),
            },
        };

        Ok(inverse)
    }
}

fn require<'a>(nodes: &'a [EditorNode], id: &str) -> MutationResult<&'a EditorNode> {
    find_node(nodes, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string()))
}

fn wrong_kind(id: &str, expected: &'static str) -> MutationError {
    MutationError::WrongKind {
        node_id: id.to_string(),
        expected,
    }
}

fn expect_kind(
    nodes: &[EditorNode],
    id: &str,
    kind: NodeKind,
    expected: &'static str,
) -> MutationResult<()> {
    if require(nodes, id)?.kind() == kind {
        Ok(())
    } else {
        Err(wrong_kind(id, expected))
    }
}

fn parent_missing(parent_id: Option<&str>) -> MutationError {
    MutationError::ParentNotFound(parent_id.unwrap_or("<root>").to_string())
}

fn with_node<F>(nodes: &mut [EditorNode], id: &str, f: F) -> MutationResult<()>
where
    F: FnOnce(&mut EditorNode),
{
    let node = find_node_mut(nodes, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
    f(node);
    Ok(())
}

/// `None` stands for the document root
fn resolve_parent<'a>(
    nodes: &'a [EditorNode],
    parent_id: Option<&str>,
) -> MutationResult<Option<&'a EditorNode>> {
    match parent_id {
        None => Ok(None),
        Some(id) => find_node(nodes, id)
            .map(Some)
            .ok_or_else(|| MutationError::ParentNotFound(id.to_string())),
    }
}

fn check_child(parent: Option<&EditorNode>, child: &EditorNode) -> MutationResult<()> {
    let child_kind = child.kind();
    let allowed = match parent.map(EditorNode::kind) {
        None | Some(NodeKind::Fold) => child_kind.is_root_block(),
        Some(NodeKind::List) => child_kind == NodeKind::ListItem,
        Some(NodeKind::TaskList) => child_kind == NodeKind::TaskItem,
        Some(kind) if kind.is_text_block() || kind.is_inline() => child_kind.is_inline(),
        Some(_) => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(MutationError::InvalidStructure(format!(
            "{} cannot hold {}",
            parent.map_or("document", |p| p.kind().as_str()),
            child_kind.as_str()
        )))
    }
}

fn check_depth(depth: usize, constraints: &Constraints) -> MutationResult<()> {
    if depth > constraints.max_fold_depth {
        Err(MutationError::FoldTooDeep {
            depth,
            max: constraints.max_fold_depth,
        })
    } else {
        Ok(())
    }
}

fn check_fold_depth(
    nodes: &[EditorNode],
    parent_id: Option<&str>,
    new_nodes: &[EditorNode],
    constraints: &Constraints,
) -> MutationResult<()> {
    let ancestors = parent_id.map_or(0, |p| fold_depth_of(nodes, p));
    for node in new_nodes {
        check_depth(ancestors + fold_nesting(node), constraints)?;
    }
    Ok(())
}

fn ids_in(nodes: &[EditorNode]) -> Vec<&str> {
    collect_where(nodes, &|n: &EditorNode| n.id().is_some_and(|id| !id.is_empty()))
        .into_iter()
        .filter_map(EditorNode::id)
        .collect()
}

/// New ids must be unique among themselves and absent from the tree, except
/// for ids inside `leaving`, which is about to be detached
fn check_ids(
    nodes: &[EditorNode],
    new_nodes: &[EditorNode],
    leaving: &[EditorNode],
) -> MutationResult<()> {
    let leaving: HashSet<&str> = ids_in(leaving).into_iter().collect();
    let existing: HashSet<&str> = ids_in(nodes)
        .into_iter()
        .filter(|id| !leaving.contains(id))
        .collect();

    let mut fresh = HashSet::new();
    for id in ids_in(new_nodes) {
        if existing.contains(id) || !fresh.insert(id) {
            return Err(MutationError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}
