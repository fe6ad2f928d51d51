//! # Post-Effect System
//!
//! Some edits leave the tree valid but degenerate: a list whose last item
//! was deleted, or a document whose last block was removed. Post-effects
//! inspect each edit after it lands and emit follow-up mutations that are
//! recorded in the same undo batch.
//!
//! Effects run in registration order, each against the tree as the previous
//! effect left it.

use crate::document::Document;
use crate::mutations::{Mutation, MutationResult};
use crate::undo_stack::UndoStack;
use jotter_common::collect_where;
use jotter_model::{EditorNode, NodeKind};
use tracing::debug;

pub trait PostEffect: std::fmt::Debug {
    /// Secondary mutations needed after `mutation`
    fn analyze(&self, mutation: &Mutation, nodes: &[EditorNode]) -> Vec<Mutation>;
}

/// Remove lists and task lists left without items
#[derive(Debug)]
pub struct DropEmptyLists;

impl PostEffect for DropEmptyLists {
    fn analyze(&self, mutation: &Mutation, nodes: &[EditorNode]) -> Vec<Mutation> {
        if !mutation.removes_content() {
            return vec![];
        }

        collect_where(nodes, &|n: &EditorNode| {
            matches!(n.kind(), NodeKind::List | NodeKind::TaskList)
                && n.children().map_or(true, |c| c.is_empty())
        })
        .into_iter()
        .filter_map(EditorNode::id)
        .map(|id| Mutation::RemoveNode {
            node_id: id.to_string(),
        })
        .collect()
    }
}

/// Keep at least one block in the document
#[derive(Debug)]
pub struct EnsureNonEmptyDocument;

impl PostEffect for EnsureNonEmptyDocument {
    fn analyze(&self, _mutation: &Mutation, nodes: &[EditorNode]) -> Vec<Mutation> {
        if !nodes.is_empty() {
            return vec![];
        }
        vec![Mutation::InsertNodes {
            parent_id: None,
            index: 0,
            nodes: vec![EditorNode::empty_paragraph(String::new())],
        }]
    }
}

#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(DropEmptyLists), Box::new(EnsureNonEmptyDocument)],
        }
    }

    pub fn empty() -> Self {
        Self { effects: vec![] }
    }

    pub fn register(&mut self, effect: Box<dyn PostEffect>) {
        self.effects.push(effect);
    }

    /// Apply a group of mutations, then every effect they trigger, as one
    /// undo entry. The group is checked against a scratch tree first so a
    /// rejected edit leaves the document untouched.
    pub fn apply_with_effects(
        &self,
        mutations: Vec<Mutation>,
        doc: &mut Document,
        undo: &mut UndoStack,
        description: &str,
    ) -> MutationResult<Vec<Mutation>> {
        let prepared: Vec<Mutation> = mutations.into_iter().map(|m| doc.prepare(m)).collect();
        doc.dry_run(&prepared)?;

        undo.begin_batch();
        undo.set_batch_description(description);
        let result = self.apply_prepared(prepared, doc, undo);
        undo.end_batch();
        result
    }

    fn apply_prepared(
        &self,
        prepared: Vec<Mutation>,
        doc: &mut Document,
        undo: &mut UndoStack,
    ) -> MutationResult<Vec<Mutation>> {
        let mut applied = Vec::with_capacity(prepared.len());
        for mutation in prepared {
            applied.push(undo.apply(mutation, doc)?);
        }

        let primaries = applied.len();
        for effect in &self.effects {
            let mut secondary: Vec<Mutation> = Vec::new();
            for mutation in &applied[..primaries] {
                for follow_up in effect.analyze(mutation, doc.nodes()) {
                    if !secondary.contains(&follow_up) {
                        secondary.push(follow_up);
                    }
                }
            }
            for follow_up in secondary {
                debug!(effect = ?effect, mutation = follow_up.name(), "Post-effect");
                applied.push(undo.apply(follow_up, doc)?);
            }
        }

        Ok(applied)
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}
