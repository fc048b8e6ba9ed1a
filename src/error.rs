// Error types for the generation pipeline

use thiserror::Error;

/// JSON extraction failure over raw model output.
///
/// Never surfaces to callers of the pipeline: normalization downgrades it
/// into a heuristic classification of the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no JSON structure found in response")]
    NoJsonFound,
}

/// Hard failures of a generation request.
///
/// Upstream completion and retrieval calls are the only error class
/// propagated to the caller; extraction, classification, and persistence
/// problems are all recovered locally.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("upstream generation call failed: {0}")]
    Upstream(#[source] anyhow::Error),

    #[error("context retrieval failed: {0}")]
    Retrieval(#[source] anyhow::Error),

    #[error("prompt assembly failed: {0}")]
    Prompt(String),
}
