// Parsers for raw model output: JSON extraction and heuristic classification

pub mod classify;
pub mod extraction;

pub use classify::{classify_text, harvest_missing_info};
pub use extraction::extract_json;
