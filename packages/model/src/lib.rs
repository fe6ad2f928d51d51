//! # Jotter Model
//!
//! The block-tree document model shared by every editor layer.
//!
//! ```text
//! persisted JSON ──load_document──▶ Vec<EditorNode> ──serialize_document──▶ persisted JSON
//! ```
//!
//! The model is the single source of truth; the editable surface is a
//! derived projection rebuilt from it.

pub mod codec;
pub mod error;
pub mod id_generator;
pub mod node;

pub use codec::{
    load_document, load_document_within, normalize_document, normalize_document_within, parse_nodes,
    serialize_document,
};
pub use error::{ModelError, ModelResult};
pub use id_generator::IdGenerator;
pub use node::{
    clamp_width, Align, EditorNode, NodeKind, DEFAULT_CODE_LANGUAGE, DEFAULT_WIDTH_PERCENT,
    MAX_FOLD_DEPTH, MIN_WIDTH_PERCENT,
};
