//! # Jotter Editor
//!
//! The editing engine: one open document, its history, its selection, and
//! the session glue that persists it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: key events, toolbar commands,         │
//! │       surface edits, timer ticks            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: guards + commands → Mutations       │
//! │  - validated against structural rules       │
//! │  - post-effects keep the tree tidy          │
//! │  - every edit is one undo entry             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ surface: model → rendered fragment          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Model is source of truth**: the surface is a derived view
//! 2. **One history**: typing, formatting and structural edits share the
//!    undo log
//! 3. **Failures are local**: the session turns them into notifications
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jotter_editor::{Caret, EditEvent, Editor, EditorConfig};
//!
//! let mut editor = Editor::load(r#"[{"type":"paragraph","id":"p1"}]"#, EditorConfig::default());
//! editor.set_caret(Caret::text("p1", 0));
//! editor.handle_edit(EditEvent::Input("Hello".into()))?;
//! let json = editor.serialize()?;
//! ```

mod autosave;
mod commands;
mod config;
mod document;
mod editor;
mod errors;
mod guards;
mod mutations;
mod post_effects;
mod selection;
mod session;
mod text_ops;
mod undo_stack;

pub use autosave::{Debouncer, ScheduledSave};
pub use commands::{BlockStyle, Command, CommandOutcome};
pub use config::EditorConfig;
pub use document::Document;
pub use editor::{Editor, EditorEvent};
pub use errors::{EditorError, EditorResult};
pub use guards::{plan_edit, EditEvent, EditPlan};
pub use mutations::{Constraints, Mutation, MutationError, MutationResult};
pub use post_effects::{DropEmptyLists, EnsureNonEmptyDocument, PostEffect, PostEffectEngine};
pub use selection::{
    caret_at_end, caret_at_start, plan_insertion, Caret, InsertionPlan, InsertionPoint, Selection,
    SelectionEngine, TextRange,
};
pub use session::{
    AssetActions, ContentSink, EditSession, HostError, MemorySink, Notification,
    NotificationLevel, SaveOutcome,
};
pub use text_ops::{Format, Style, StyledRun};
pub use undo_stack::{MutationBatch, UndoStack};
