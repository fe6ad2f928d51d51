use anyhow::Context;
use jotter_editor::EditorConfig;
use jotter_workspace::EntryStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "jotter.config.json";

/// Jotter configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding one folder per entry
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default)]
    pub editor: EditorConfig,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Malformed {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Absolute path of the data directory
    pub fn get_data_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.data_dir)
    }

    pub fn entries(&self, cwd: &str) -> EntryStore {
        EntryStore::new(self.get_data_dir(cwd))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            editor: EditorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "dataDir": "/var/lib/jotter",
            "editor": { "autosaveDebounceMs": 500, "maxFoldDepth": 2 }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_dir, "/var/lib/jotter");
        assert_eq!(config.editor.autosave_debounce_ms, 500);
        assert_eq!(config.editor.max_fold_depth, 2);
        assert_eq!(config.editor.undo_levels, 100);
        assert_eq!(config.get_data_dir("/home/u"), PathBuf::from("/var/lib/jotter"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.data_dir, "data");
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ nope").unwrap();
        assert!(Config::load(dir.path().to_str().unwrap()).is_err());
    }
}
