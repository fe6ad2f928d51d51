//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Document error: {0}")]
    Model(#[from] jotter_model::ModelError),

    #[error("Asset error: {0}")]
    Asset(#[from] jotter_assets::AssetError),

    #[error("Failed to persist document: {0}")]
    Persist(String),

    #[error("No node with id {0}")]
    UnknownNode(String),

    #[error("Node {id} is not {expected}")]
    WrongKind { id: String, expected: &'static str },
}

pub type EditorResult<T> = Result<T, EditorError>;
