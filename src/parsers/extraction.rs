// JSON extraction from raw model output

use crate::error::ExtractError;
use regex::Regex;

/// Extract the JSON payload candidate from raw model output.
///
/// Tries, in order:
/// 1. the first fenced ```json code block;
/// 2. the largest substring bounded by the first `{` and the last `}`.
///
/// This is a best-effort heuristic, not a parser: it assumes the output
/// contains at most one JSON object of interest. Validity is checked by
/// the caller when it parses the returned candidate.
pub fn extract_json(raw: &str) -> Result<String, ExtractError> {
    let fence = Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap();
    if let Some(captures) = fence.captures(raw) {
        if let Some(block) = captures.get(1) {
            return Ok(block.as_str().trim().to_string());
        }
    }

    // Greedy brace span: first '{' through last '}'
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return Ok(raw[start..=end].to_string());
        }
    }

    Err(ExtractError::NoJsonFound)
}
