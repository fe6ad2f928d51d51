use thiserror::Error;

/// Asset storage errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {path}")]
    NotFound { path: String },

    #[error("Invalid asset path: {path}")]
    InvalidPath { path: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list assets: {0}")]
    List(#[source] std::io::Error),

    #[error("Asset store unavailable: {0}")]
    Unavailable(String),
}

pub type AssetResult<T> = Result<T, AssetError>;
