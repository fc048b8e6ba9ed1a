// Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of context chunks requested from the retriever per query
pub const DEFAULT_RETRIEVAL_TOP_K: usize = 5;

/// Number of input items per chunked generation call
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Configuration for the content engine and session store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one history file per session
    pub history_dir: PathBuf,
    /// Top-k passed to the context retriever
    pub retrieval_top_k: usize,
    /// Batch size for chunked epic/story generation
    pub batch_size: usize,
    /// Skip turns whose exact query text is already in memory when loading
    /// history files. Off by default: repeated questions are legitimate.
    pub dedupe_queries_on_load: bool,
    /// Base pacing for thinking-step messages, in milliseconds. Zero keeps
    /// the steps observable without delaying the pipeline.
    pub thinking_pace_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            history_dir: default_history_dir(),
            retrieval_top_k: DEFAULT_RETRIEVAL_TOP_K,
            batch_size: DEFAULT_BATCH_SIZE,
            dedupe_queries_on_load: false,
            thinking_pace_ms: 0,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration values
    /// Returns Ok(()) if valid, or Err with a descriptive error message
    pub fn validate(&self) -> Result<(), String> {
        if self.retrieval_top_k == 0 {
            return Err("retrieval_top_k must be greater than 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.history_dir.as_os_str().is_empty() {
            return Err("history_dir must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {:?}: {}", path, e))?;

        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {:?}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }
}

/// Default session history directory: the platform data dir when available,
/// a relative directory otherwise
fn default_history_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("reqsmith").join("conversation_histories"))
        .unwrap_or_else(|| PathBuf::from("conversation_histories"))
}
