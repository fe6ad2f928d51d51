//! # Tree Utilities
//!
//! Generic find/remove/update walks over the document tree, parameterized by
//! a node predicate. The id-based helpers are thin wrappers over the
//! predicate versions, so every node kind is handled by the same code.

use jotter_model::{EditorNode, NodeKind};

/// Where a node sits in the tree: its parent's id (`None` for the document
/// root) and its index among the parent's children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub parent_id: Option<String>,
    pub index: usize,
}

impl Location {
    pub fn root(index: usize) -> Self {
        Self {
            parent_id: None,
            index,
        }
    }

    pub fn child_of(parent_id: impl Into<String>, index: usize) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            index,
        }
    }
}

/// A node detached from the tree, with the location it was taken from
#[derive(Debug, Clone, PartialEq)]
pub struct Removed {
    pub node: EditorNode,
    pub location: Location,
}

/// First node (pre-order) matching the predicate
pub fn find_where<'a, P>(nodes: &'a [EditorNode], pred: &P) -> Option<&'a EditorNode>
where
    P: Fn(&EditorNode) -> bool,
{
    for node in nodes {
        if pred(node) {
            return Some(node);
        }
        if let Some(children) = node.children() {
            if let Some(found) = find_where(children, pred) {
                return Some(found);
            }
        }
    }
    None
}

pub fn find_where_mut<'a, P>(nodes: &'a mut [EditorNode], pred: &P) -> Option<&'a mut EditorNode>
where
    P: Fn(&EditorNode) -> bool,
{
    for node in nodes.iter_mut() {
        if pred(&*node) {
            return Some(node);
        }
        if let Some(children) = node.children_mut() {
            if let Some(found) = find_where_mut(children, pred) {
                return Some(found);
            }
        }
    }
    None
}

pub fn find_node<'a>(nodes: &'a [EditorNode], id: &str) -> Option<&'a EditorNode> {
    find_where(nodes, &|n: &EditorNode| n.has_id(id))
}

pub fn find_node_mut<'a>(nodes: &'a mut [EditorNode], id: &str) -> Option<&'a mut EditorNode> {
    find_where_mut(nodes, &|n: &EditorNode| n.has_id(id))
}

pub fn contains_id(nodes: &[EditorNode], id: &str) -> bool {
    find_node(nodes, id).is_some()
}

/// All nodes matching the predicate, in reading order
pub fn collect_where<'a, P>(nodes: &'a [EditorNode], pred: &P) -> Vec<&'a EditorNode>
where
    P: Fn(&EditorNode) -> bool,
{
    let mut out = Vec::new();
    collect_into(nodes, pred, &mut out);
    out
}

fn collect_into<'a, P>(nodes: &'a [EditorNode], pred: &P, out: &mut Vec<&'a EditorNode>)
where
    P: Fn(&EditorNode) -> bool,
{
    for node in nodes {
        if pred(node) {
            out.push(node);
        }
        if let Some(children) = node.children() {
            collect_into(children, pred, out);
        }
    }
}

/// Text-bearing blocks (paragraphs, headings, list and task items) in
/// reading order
pub fn text_blocks_in_order(nodes: &[EditorNode]) -> Vec<&EditorNode> {
    collect_where(nodes, &|n: &EditorNode| n.is_text_block())
}

/// Root-to-node chain ending at the node with `id`
pub fn path_to<'a>(nodes: &'a [EditorNode], id: &str) -> Option<Vec<&'a EditorNode>> {
    for node in nodes {
        if node.has_id(id) {
            return Some(vec![node]);
        }
        if let Some(children) = node.children() {
            if let Some(mut path) = path_to(children, id) {
                path.insert(0, node);
                return Some(path);
            }
        }
    }
    None
}

/// Index of the root-level block that is, or contains, the node with `id`
pub fn root_index_of(nodes: &[EditorNode], id: &str) -> Option<usize> {
    nodes.iter().position(|root| {
        root.has_id(id)
            || root
                .children()
                .map(|children| contains_id(children, id))
                .unwrap_or(false)
    })
}

pub fn locate(nodes: &[EditorNode], id: &str) -> Option<Location> {
    locate_in(nodes, None, id)
}

fn locate_in(nodes: &[EditorNode], parent_id: Option<&str>, id: &str) -> Option<Location> {
    if let Some(index) = nodes.iter().position(|n| n.has_id(id)) {
        return Some(Location {
            parent_id: parent_id.map(str::to_string),
            index,
        });
    }
    for node in nodes {
        if let Some(children) = node.children() {
            if let Some(location) = locate_in(children, node.id(), id) {
                return Some(location);
            }
        }
    }
    None
}

/// Child list of `parent_id`, or the root list for `None`
pub fn children_of<'a>(nodes: &'a [EditorNode], parent_id: Option<&str>) -> Option<&'a [EditorNode]> {
    match parent_id {
        None => Some(nodes),
        Some(id) => find_node(nodes, id)?.children().map(|c| c.as_slice()),
    }
}

pub fn children_of_mut<'a>(
    nodes: &'a mut Vec<EditorNode>,
    parent_id: Option<&str>,
) -> Option<&'a mut Vec<EditorNode>> {
    match parent_id {
        None => Some(nodes),
        Some(id) => find_node_mut(nodes, id)?.children_mut(),
    }
}

/// Detach the first node matching the predicate
pub fn remove_where<P>(nodes: &mut Vec<EditorNode>, pred: &P) -> Option<Removed>
where
    P: Fn(&EditorNode) -> bool,
{
    remove_in(nodes, None, pred)
}

fn remove_in<P>(nodes: &mut Vec<EditorNode>, parent_id: Option<&str>, pred: &P) -> Option<Removed>
where
    P: Fn(&EditorNode) -> bool,
{
    if let Some(index) = nodes.iter().position(|n| pred(n)) {
        let node = nodes.remove(index);
        return Some(Removed {
            node,
            location: Location {
                parent_id: parent_id.map(str::to_string),
                index,
            },
        });
    }

    for node in nodes.iter_mut() {
        let id = node.id().map(str::to_string);
        if let Some(children) = node.children_mut() {
            if let Some(removed) = remove_in(children, id.as_deref(), pred) {
                return Some(removed);
            }
        }
    }
    None
}

pub fn remove_node(nodes: &mut Vec<EditorNode>, id: &str) -> Option<Removed> {
    remove_where(nodes, &|n: &EditorNode| n.has_id(id))
}

/// Swap the node with `id` for `replacement`, returning the old node
pub fn replace_node(nodes: &mut [EditorNode], id: &str, replacement: EditorNode) -> Option<EditorNode> {
    let slot = find_node_mut(nodes, id)?;
    Some(std::mem::replace(slot, replacement))
}

/// Run `f` on the node with `id`. Returns false when no such node exists.
pub fn update_node<F>(nodes: &mut [EditorNode], id: &str, f: F) -> bool
where
    F: FnOnce(&mut EditorNode),
{
    match find_node_mut(nodes, id) {
        Some(node) => {
            f(node);
            true
        }
        None => false,
    }
}

/// Insert `new_nodes` into `parent_id`'s children at `index` (clamped)
pub fn insert_children(
    nodes: &mut Vec<EditorNode>,
    parent_id: Option<&str>,
    index: usize,
    new_nodes: Vec<EditorNode>,
) -> bool {
    match children_of_mut(nodes, parent_id) {
        Some(children) => {
            let at = index.min(children.len());
            children.splice(at..at, new_nodes);
            true
        }
        None => false,
    }
}

/// Number of fold nodes on the chain from the root down to `id`, counting
/// the node itself
pub fn fold_depth_of(nodes: &[EditorNode], id: &str) -> usize {
    path_to(nodes, id)
        .map(|path| path.iter().filter(|n| n.kind() == NodeKind::Fold).count())
        .unwrap_or(0)
}

/// Deepest chain of nested folds inside `node`, counting the node itself
pub fn fold_nesting(node: &EditorNode) -> usize {
    let own = usize::from(node.kind() == NodeKind::Fold);
    let inner = node
        .children()
        .map(|children| children.iter().map(fold_nesting).max().unwrap_or(0))
        .unwrap_or(0);
    own + inner
}
