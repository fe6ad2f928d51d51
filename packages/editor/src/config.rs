use jotter_assets::DEFAULT_DIGEST_LENGTH;
use jotter_model::{DEFAULT_CODE_LANGUAGE, MAX_FOLD_DEPTH};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor settings, stored as camelCase JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Quiet period after the last content edit before autosave fires
    pub autosave_debounce_ms: u64,

    /// Undo history depth (0 = unlimited)
    pub undo_levels: usize,

    /// Maximum number of nested folds
    pub max_fold_depth: usize,

    /// Hex characters kept from an asset's content hash
    pub digest_length: usize,

    pub default_code_language: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: 1500,
            undo_levels: 100,
            max_fold_depth: MAX_FOLD_DEPTH,
            digest_length: DEFAULT_DIGEST_LENGTH,
            default_code_language: DEFAULT_CODE_LANGUAGE.to_string(),
        }
    }
}

impl EditorConfig {
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}
