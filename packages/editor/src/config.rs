use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::errors::{EditorError, EditorResult};
use crate::export::SpliceExporter;
use crate::undo_stack::{HistoryConfig, DEFAULT_MAX_DEPTH, DEFAULT_MERGE_WINDOW};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tessera_syntax::prefab::ENTITIES_FIELD;
use tessera_syntax::Parser;

pub const DEFAULT_CONFIG_NAME: &str = "tessera.config.json";

/// Tessera configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum undo levels per document (0 = unlimited)
    #[serde(default = "default_max_undo_depth")]
    pub max_undo_depth: usize,

    /// Edits closer together than this merge into one undo step
    #[serde(default = "default_merge_window_ms")]
    pub merge_window_ms: u64,

    /// Parsed documents kept in memory
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Top-level field holding the entity array
    #[serde(default = "default_splice_field")]
    pub splice_field: String,
}

fn default_max_undo_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_merge_window_ms() -> u64 {
    DEFAULT_MERGE_WINDOW.as_millis() as u64
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_splice_field() -> String {
    ENTITIES_FIELD.to_string()
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: &Path) -> EditorResult<Self> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| EditorError::Config(format!("{}: {}", config_path.display(), e)))?;
            Self::from_json(&content)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }

    pub fn from_json(content: &str) -> EditorResult<Self> {
        let config: EditorConfig =
            serde_json::from_str(content).map_err(|e| EditorError::Config(e.to_string()))?;
        if config.splice_field.is_empty() {
            return Err(EditorError::Config("spliceField must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            max_depth: self.max_undo_depth,
            merge_window: Duration::from_millis(self.merge_window_ms),
        }
    }

    pub fn parser(&self) -> Parser {
        Parser::new(self.splice_field.clone())
    }

    pub fn exporter(&self) -> SpliceExporter {
        SpliceExporter::new(self.splice_field.clone())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: default_max_undo_depth(),
            merge_window_ms: default_merge_window_ms(),
            cache_capacity: default_cache_capacity(),
            splice_field: default_splice_field(),
        }
    }
}
