use jotter_model::EditorNode;

/// Visitor pattern for traversing document trees immutably
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor: Sized {
    fn visit_document(&mut self, nodes: &[EditorNode]) {
        walk_document(self, nodes);
    }

    fn visit_node(&mut self, node: &EditorNode) {
        walk_node(self, node);
    }

    fn visit_text(&mut self, _value: &str) {
        // Leaf node, no children to walk
    }
}

/// Mutable visitor pattern for transforming document trees
///
/// Similar to Visitor, but provides mutable access to nodes.
pub trait VisitorMut: Sized {
    fn visit_document_mut(&mut self, nodes: &mut [EditorNode]) {
        walk_document_mut(self, nodes);
    }

    fn visit_node_mut(&mut self, node: &mut EditorNode) {
        walk_node_mut(self, node);
    }

    fn visit_text_mut(&mut self, _value: &mut String) {
        // Leaf node, no children to walk
    }
}

// Default walk implementations for immutable visitor

pub fn walk_document<V: Visitor>(visitor: &mut V, nodes: &[EditorNode]) {
    for node in nodes {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &EditorNode) {
    match node {
        EditorNode::Text { value } => visitor.visit_text(value),
        EditorNode::Image { .. } | EditorNode::File { .. } | EditorNode::Code { .. } => {
            // Leaf blocks
        }
        other => {
            if let Some(children) = other.children() {
                for child in children {
                    visitor.visit_node(child);
                }
            }
        }
    }
}

// Default walk implementations for mutable visitor

pub fn walk_document_mut<V: VisitorMut>(visitor: &mut V, nodes: &mut [EditorNode]) {
    for node in nodes {
        visitor.visit_node_mut(node);
    }
}

pub fn walk_node_mut<V: VisitorMut>(visitor: &mut V, node: &mut EditorNode) {
    match node {
        EditorNode::Text { value } => visitor.visit_text_mut(value),
        EditorNode::Image { .. } | EditorNode::File { .. } | EditorNode::Code { .. } => {
            // Leaf blocks
        }
        other => {
            if let Some(children) = other.children_mut() {
                for child in children {
                    visitor.visit_node_mut(child);
                }
            }
        }
    }
}
