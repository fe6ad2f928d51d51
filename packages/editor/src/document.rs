//! # Document Handle
//!
//! The editable document: the block tree, its version counter, the id
//! generator that mints block ids, and the structural limits mutations are
//! validated against.
//!
//! ```text
//! JSON ──load──▶ Document ──apply(Mutation)──▶ Document ──serialize──▶ JSON
//!                    │ version += 1 per applied mutation
//! ```

use crate::mutations::{Constraints, Mutation, MutationResult};
use jotter_common::{find_node, walk_node_mut, VisitorMut};
use jotter_model::{
    load_document_within, normalize_document_within, serialize_document, EditorNode, IdGenerator,
    ModelResult,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Document {
    /// Incremented on every applied mutation
    pub version: u64,

    nodes: Vec<EditorNode>,
    ids: IdGenerator,
    constraints: Constraints,
}

impl Document {
    /// Load persisted content. Malformed input yields an empty document.
    pub fn load(source: &str, mut ids: IdGenerator, constraints: Constraints) -> Self {
        let nodes = load_document_within(source, &mut ids, constraints.max_fold_depth);
        Self {
            version: 0,
            nodes,
            ids,
            constraints,
        }
    }

    pub fn from_nodes(nodes: Vec<EditorNode>, mut ids: IdGenerator, constraints: Constraints) -> Self {
        let nodes = normalize_document_within(nodes, &mut ids, constraints.max_fold_depth);
        Self {
            version: 0,
            nodes,
            ids,
            constraints,
        }
    }

    pub fn nodes(&self) -> &[EditorNode] {
        &self.nodes
    }

    /// Direct tree access for display-only fields that never enter history
    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<EditorNode> {
        &mut self.nodes
    }

    /// Tree and id generator borrowed together, for parsers that mint ids
    /// while reading the tree
    pub fn parts(&mut self) -> (&[EditorNode], &mut IdGenerator) {
        (&self.nodes, &mut self.ids)
    }

    pub fn ids_mut(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    pub fn new_id(&mut self) -> String {
        self.ids.new_id()
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn find(&self, id: &str) -> Option<&EditorNode> {
        find_node(&self.nodes, id)
    }

    /// Give every block in the mutation's payload an id. Blocks built by
    /// effects and commands may leave the id empty.
    pub fn prepare(&mut self, mut mutation: Mutation) -> Mutation {
        let mut filler = IdFiller(&mut self.ids);
        match &mut mutation {
            Mutation::InsertNodes { nodes, .. }
            | Mutation::SetChildren {
                children: nodes, ..
            }
            | Mutation::ReplaceDocument { nodes } => filler.visit_document_mut(nodes),
            Mutation::ReplaceNode { node, .. } => filler.visit_node_mut(node),
            _ => {}
        }
        mutation
    }

    /// Apply a validated mutation and bump the version
    pub fn apply(&mut self, mutation: &Mutation) -> MutationResult<u64> {
        mutation.apply(&mut self.nodes, &self.constraints)?;
        self.version += 1;
        debug!(version = self.version, mutation = mutation.name(), "Applied mutation");
        Ok(self.version)
    }

    /// Check a sequence of mutations against a scratch copy of the tree
    pub fn dry_run(&self, mutations: &[Mutation]) -> MutationResult<()> {
        let mut scratch = self.nodes.clone();
        for mutation in mutations {
            mutation.apply(&mut scratch, &self.constraints)?;
        }
        Ok(())
    }

    pub fn serialize(&self) -> ModelResult<String> {
        serialize_document(&self.nodes)
    }
}

struct IdFiller<'a>(&'a mut IdGenerator);

impl VisitorMut for IdFiller<'_> {
    fn visit_node_mut(&mut self, node: &mut EditorNode) {
        if let Some(id) = node.id_mut() {
            if id.is_empty() {
                *id = self.0.new_id();
            }
        }
        walk_node_mut(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_malformed_is_one_empty_paragraph() {
        let doc = Document::load("not json", IdGenerator::from_seed("t"), Constraints::default());
        assert_eq!(doc.nodes(), &[EditorNode::empty_paragraph("t-1")]);
        assert_eq!(doc.version, 0);
    }

    #[test]
    fn test_prepare_fills_missing_ids() {
        let mut doc = Document::load("[]", IdGenerator::from_seed("t"), Constraints::default());
        let mutation = doc.prepare(Mutation::InsertNodes {
            parent_id: None,
            index: 1,
            nodes: vec![EditorNode::fold(
                "",
                vec![EditorNode::paragraph("", vec![EditorNode::text("x")])],
            )],
        });

        doc.apply(&mutation).unwrap();
        assert_eq!(doc.version, 1);
        assert!(doc.find("t-2").is_some());
        assert!(doc.find("t-3").is_some());
    }

    #[test]
    fn test_dry_run_leaves_tree_alone() {
        let doc = Document::load("[]", IdGenerator::from_seed("t"), Constraints::default());
        let result = doc.dry_run(&[
            Mutation::RemoveNode {
                node_id: "t-1".to_string(),
            },
            Mutation::RemoveNode {
                node_id: "t-1".to_string(),
            },
        ]);
        assert!(result.is_err());
        assert_eq!(doc.nodes().len(), 1);
    }
}
