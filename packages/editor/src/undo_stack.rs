//! # Undo/Redo Stack
//!
//! One history for every edit, whether it came from a command, a guarded
//! keystroke, an asset insertion or a surface resync.
//!
//! - each mutation records its exact inverse before being applied
//! - undo applies the inverses in reverse order and moves the batch to redo
//! - redo reapplies the original mutations
//! - new mutations clear the redo stack
//! - batches nest; only the outermost `end_batch` pushes a history entry

use crate::document::Document;
use crate::mutations::{Mutation, MutationResult};
use tracing::debug;

/// A group of mutations undone and redone together
#[derive(Debug, Clone, Default)]
pub struct MutationBatch {
    /// In application order
    pub mutations: Vec<Mutation>,

    /// In undo order (reverse of application)
    pub inverses: Vec<Mutation>,

    pub description: Option<String>,
}

impl MutationBatch {
    pub fn single(mutation: Mutation, inverse: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
            inverses: vec![inverse],
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug)]
pub struct UndoStack {
    undo_stack: Vec<MutationBatch>,
    redo_stack: Vec<MutationBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    current_batch: Option<MutationBatch>,
    batch_depth: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
            batch_depth: 0,
        }
    }

    /// Fill ids, apply, and record. Returns the mutation as applied.
    pub fn apply(&mut self, mutation: Mutation, doc: &mut Document) -> MutationResult<Mutation> {
        let mutation = doc.prepare(mutation);
        let inverse = mutation.to_inverse(doc.nodes())?;
        doc.apply(&mutation)?;

        if let Some(batch) = &mut self.current_batch {
            batch.mutations.push(mutation.clone());
            batch.inverses.insert(0, inverse);
        } else {
            let batch = MutationBatch::single(mutation.clone(), inverse)
                .with_description(mutation.name());
            self.push_batch(batch);
        }

        Ok(mutation)
    }

    pub fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.current_batch = Some(MutationBatch::default());
        }
        self.batch_depth += 1;
    }

    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        if let Some(mut batch) = self.current_batch.take() {
            if !batch.mutations.is_empty() {
                if batch.description.is_none() {
                    batch.description = batch.mutations.first().map(|m| m.name().to_string());
                }
                self.push_batch(batch);
            }
        }
    }

    /// Description for the current batch; the outermost caller's wins
    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            if batch.description.is_none() {
                batch.description = Some(description.into());
            }
        }
    }

    fn push_batch(&mut self, batch: MutationBatch) {
        self.undo_stack.push(batch);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    pub fn undo(&mut self, doc: &mut Document) -> MutationResult<bool> {
        let Some(batch) = self.undo_stack.pop() else {
            return Ok(false);
        };

        for inverse in &batch.inverses {
            doc.apply(inverse)?;
        }
        debug!(description = ?batch.description, "Undo");
        self.redo_stack.push(batch);
        Ok(true)
    }

    pub fn redo(&mut self, doc: &mut Document) -> MutationResult<bool> {
        let Some(batch) = self.redo_stack.pop() else {
            return Ok(false);
        };

        for mutation in &batch.mutations {
            doc.apply(mutation)?;
        }
        debug!(description = ?batch.description, "Redo");
        self.undo_stack.push(batch);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
        self.batch_depth = 0;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
