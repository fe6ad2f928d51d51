//! # Editing Pipeline
//!
//! [`Editor`] coordinates one open document: Mutate → Effects → Render.
//!
//! - every change is a group of mutations applied through the post-effect
//!   engine and recorded as one undo entry
//! - after a structural change the surface is re-rendered from the model
//! - edits made directly on the surface are parsed back and recorded as a
//!   document replacement, without re-rendering what the user is typing in
//! - the selection is reconciled after every change

use jotter_common::{find_node, walk_node_mut, TaskProgress, VisitorMut};
use jotter_model::{EditorNode, IdGenerator};
use jotter_surface::{enrich, parse_markup, to_markup, Renderer, SurfaceFragment, SurfaceParser};
use tracing::{debug, info, instrument};

use crate::config::EditorConfig;
use crate::document::Document;
use crate::errors::{EditorError, EditorResult};
use crate::guards::{plan_edit, EditEvent, EditPlan};
use crate::mutations::{Constraints, Mutation};
use crate::post_effects::PostEffectEngine;
use crate::selection::{caret_at_start, plan_insertion, Caret, InsertionPoint, Selection, SelectionEngine};
use crate::undo_stack::UndoStack;

/// Notifications for the host shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The document changed; the host should schedule a save
    Changed { version: u64 },
    /// The document was replaced from outside
    Reloaded,
}

pub struct Editor {
    document: Document,
    undo: UndoStack,
    effects: PostEffectEngine,
    selection: SelectionEngine,
    renderer: Renderer,
    config: EditorConfig,
    surface: SurfaceFragment,
    events: Vec<EditorEvent>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::load("[]", config)
    }

    pub fn load(source: &str, config: EditorConfig) -> Self {
        Self::load_with_ids(source, IdGenerator::new(), config)
    }

    pub fn load_with_ids(source: &str, ids: IdGenerator, config: EditorConfig) -> Self {
        let constraints = Constraints {
            max_fold_depth: config.max_fold_depth,
        };
        let document = Document::load(source, ids, constraints);
        let renderer = Renderer::new();
        let surface = renderer.render(document.nodes());
        info!(blocks = document.nodes().len(), "Loaded document");

        Self {
            document,
            undo: UndoStack::with_max_levels(config.undo_levels),
            effects: PostEffectEngine::new(),
            selection: SelectionEngine::new(),
            renderer,
            config,
            surface,
            events: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn nodes(&self) -> &[EditorNode] {
        self.document.nodes()
    }

    pub fn version(&self) -> u64 {
        self.document.version
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn new_id(&mut self) -> String {
        self.document.new_id()
    }

    // Selection

    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    pub fn set_caret(&mut self, caret: Caret) {
        self.selection.set_caret(caret, self.document.nodes());
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection.set(selection, self.document.nodes());
    }

    /// Focus left the surface
    pub fn blur(&mut self) {
        self.selection.blur();
    }

    /// Snapshot the selection before focus moves to a toolbar control
    pub fn save_selection(&mut self) {
        self.selection.save();
    }

    pub(crate) fn restore_selection(&mut self) -> bool {
        self.selection.restore(self.document.nodes())
    }

    pub fn capture_insertion_point(&self) -> InsertionPoint {
        self.selection.capture()
    }

    // Mutation

    /// Apply a group of mutations as one undoable edit
    pub fn apply(&mut self, mutations: Vec<Mutation>, description: &str) -> EditorResult<Vec<Mutation>> {
        let applied = self.apply_inner(mutations, description)?;
        self.rerender();
        Ok(applied)
    }

    fn apply_inner(&mut self, mutations: Vec<Mutation>, description: &str) -> EditorResult<Vec<Mutation>> {
        let applied =
            self.effects
                .apply_with_effects(mutations, &mut self.document, &mut self.undo, description)?;
        self.selection.reconcile(self.document.nodes());
        self.events.push(EditorEvent::Changed {
            version: self.document.version,
        });
        debug!(
            description,
            mutations = applied.len(),
            version = self.document.version,
            "Applied edit"
        );
        Ok(applied)
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        let undone = self.undo.undo(&mut self.document)?;
        if undone {
            self.after_history_step();
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        let redone = self.undo.redo(&mut self.document)?;
        if redone {
            self.after_history_step();
        }
        Ok(redone)
    }

    fn after_history_step(&mut self) {
        self.selection.reconcile(self.document.nodes());
        self.ensure_caret();
        self.events.push(EditorEvent::Changed {
            version: self.document.version,
        });
        self.rerender();
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    fn ensure_caret(&mut self) {
        if self.selection.current().is_some() || !self.selection.is_focused() {
            return;
        }
        if let Some(caret) = self.document.nodes().first().and_then(caret_at_start) {
            self.selection.set_caret(caret, self.document.nodes());
        }
    }

    // Surface

    pub fn surface(&self) -> &SurfaceFragment {
        &self.surface
    }

    pub fn render_markup(&self) -> String {
        to_markup(&self.surface)
    }

    /// Surface with syntax highlighting and file icons applied
    pub fn render_enriched<F>(&self, icon_for: F) -> SurfaceFragment
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut fragment = self.surface.clone();
        enrich(&mut fragment, icon_for);
        fragment
    }

    fn rerender(&mut self) {
        self.surface = self.renderer.render(self.document.nodes());
    }

    /// Read the edited surface back into the model. Returns whether the
    /// document changed.
    #[instrument(skip(self, fragment), fields(version = self.document.version))]
    pub fn sync_from_surface(&mut self, fragment: &SurfaceFragment) -> EditorResult<bool> {
        let mut parsed = {
            let (_, ids) = self.document.parts();
            SurfaceParser::new(ids).parse(fragment)
        };
        DerivedFields {
            current: self.document.nodes(),
        }
        .visit_document_mut(&mut parsed);

        if parsed.as_slice() == self.document.nodes() {
            self.surface = fragment.clone();
            return Ok(false);
        }

        // A rejected edit leaves the surface showing the model again
        if let Err(e) = self.apply_inner(vec![Mutation::ReplaceDocument { nodes: parsed }], "typing") {
            self.rerender();
            return Err(e);
        }
        self.surface = fragment.clone();
        Ok(true)
    }

    pub fn sync_from_markup(&mut self, markup: &str) -> EditorResult<bool> {
        self.sync_from_surface(&parse_markup(markup))
    }

    // Editing

    /// Route a key event through the guards
    pub fn handle_edit(&mut self, event: EditEvent) -> EditorResult<bool> {
        let Some(caret) = self.selection.caret() else {
            return Ok(false);
        };

        let plan = {
            let (nodes, ids) = self.document.parts();
            plan_edit(&event, &caret, nodes, ids)
        };

        match plan {
            EditPlan::Reject => {
                debug!(?event, ?caret, "Edit rejected");
                Ok(false)
            }
            EditPlan::MoveCaret(caret) => {
                self.set_caret(caret);
                Ok(false)
            }
            EditPlan::Mutate { mutations, caret } => {
                self.apply(mutations, "typing")?;
                match caret {
                    Some(caret) => self.set_caret(caret),
                    None => self.ensure_caret(),
                }
                Ok(true)
            }
        }
    }

    /// Insert blocks where the cursor is (or was last)
    pub fn insert_blocks(&mut self, blocks: Vec<EditorNode>, description: &str) -> EditorResult<Vec<EditorNode>> {
        let point = self.selection.capture();
        self.insert_at(&point, blocks, description)
    }

    /// Insert blocks at a previously captured position
    pub fn insert_at(
        &mut self,
        point: &InsertionPoint,
        blocks: Vec<EditorNode>,
        description: &str,
    ) -> EditorResult<Vec<EditorNode>> {
        let plan = plan_insertion(point, self.document.nodes());
        let mutations = plan.to_mutations(self.document.nodes(), blocks);
        let applied = self.apply(mutations, description)?;

        let inserted: Vec<EditorNode> = applied
            .into_iter()
            .find_map(|m| match m {
                Mutation::InsertNodes { nodes, .. } => Some(nodes),
                _ => None,
            })
            .unwrap_or_default();
        self.selection.after_insert(&inserted, self.document.nodes());
        Ok(inserted)
    }

    /// Kind-checked lookup used by id-targeted commands
    pub(crate) fn expect_node(&self, id: &str) -> EditorResult<&EditorNode> {
        self.document
            .find(id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))
    }

    // Persistence

    pub fn serialize(&self) -> EditorResult<String> {
        Ok(self.document.serialize()?)
    }

    pub fn task_progress(&self) -> TaskProgress {
        TaskProgress::of(self.document.nodes())
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replace the document with externally changed content. History is
    /// cleared; ids keep counting from the current generator.
    pub fn reload(&mut self, source: &str) {
        let ids = self.document.ids_mut().clone();
        let constraints = *self.document.constraints();
        self.document = Document::load(source, ids, constraints);
        self.undo.clear();
        self.selection.reconcile(self.document.nodes());
        self.events.push(EditorEvent::Reloaded);
        self.rerender();
        info!(blocks = self.document.nodes().len(), "Reloaded document");
    }

    /// Fill display-only asset fields: urls and file sizes. These never
    /// enter undo history.
    pub fn hydrate_assets<F, G>(&mut self, size_of: F, url_for: G)
    where
        F: Fn(&str) -> Option<u64>,
        G: Fn(&str) -> String,
    {
        let mut hydrator = Hydrator { size_of, url_for };
        hydrator.visit_document_mut(self.document.nodes_mut());
        self.rerender();
    }
}

/// Carries display-only fields the surface does not encode from the
/// current tree onto a freshly parsed one
struct DerivedFields<'a> {
    current: &'a [EditorNode],
}

impl VisitorMut for DerivedFields<'_> {
    fn visit_node_mut(&mut self, node: &mut EditorNode) {
        if let EditorNode::File {
            id,
            file_size,
            asset_path,
            ..
        } = node
        {
            if let Some(EditorNode::File {
                file_size: known,
                asset_path: known_path,
                ..
            }) = find_node(self.current, id)
            {
                if file_size.is_none() && known_path == asset_path {
                    *file_size = *known;
                }
            }
        }
        walk_node_mut(self, node);
    }
}

struct Hydrator<F, G> {
    size_of: F,
    url_for: G,
}

impl<F, G> VisitorMut for Hydrator<F, G>
where
    F: Fn(&str) -> Option<u64>,
    G: Fn(&str) -> String,
{
    fn visit_node_mut(&mut self, node: &mut EditorNode) {
        match node {
            EditorNode::Image {
                url,
                asset_path: Some(path),
                ..
            } => *url = (self.url_for)(path),
            EditorNode::File {
                url,
                file_size,
                asset_path: Some(path),
                ..
            } => {
                *url = (self.url_for)(path);
                *file_size = (self.size_of)(path);
            }
            _ => {}
        }
        walk_node_mut(self, node);
    }
}
