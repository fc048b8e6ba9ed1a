// Heuristic status classification and missing-info harvesting

use crate::models::ResponseStatus;
use regex::Regex;

/// Classify free text into the status taxonomy by keyword scan.
///
/// Fixed priority order: insufficient-information phrases, then the word
/// "error", then requirement vocabulary, then the general fallback.
pub fn classify_text(text: &str) -> ResponseStatus {
    let lower = text.to_lowercase();

    if lower.contains("información insuficiente")
        || lower.contains("informacion insuficiente")
        || lower.contains("necesito más información")
        || lower.contains("necesito mas informacion")
    {
        return ResponseStatus::InsufficientInfo;
    }

    if lower.contains("error") {
        return ResponseStatus::ProcessingError;
    }

    if lower.contains("requerimiento")
        || lower.contains("requisito")
        || lower.contains("requirement")
        || lower.contains("requisite")
    {
        return ResponseStatus::Generated;
    }

    ResponseStatus::General
}

/// Harvest a missing-information list from free text.
///
/// The scan is scoped to the tail of a "necesito/falta ... información/
/// detalles" phrase when one is present, otherwise the whole text. Within
/// the scope: numbered markers first (works for inline lists like
/// `1. presupuesto 2. plazo`), then bulleted lines, then a sentence split.
/// Returns `None` when nothing usable is found; the caller synthesizes the
/// placeholder in that case.
pub fn harvest_missing_info(text: &str) -> Option<Vec<String>> {
    let window =
        Regex::new(r"(?is)(?:necesito|falta).*?(?:información|informacion|detalles)(.*?)(?:para generar|$)")
            .unwrap();

    let scope = window
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(text);

    let items = numbered_items(scope)
        .or_else(|| bulleted_items(scope))
        .or_else(|| sentence_items(scope));

    items.filter(|items| !items.is_empty())
}

/// Split on `1.` / `2.` style markers. Handles both one-per-line and
/// inline enumerations.
fn numbered_items(text: &str) -> Option<Vec<String>> {
    let marker = Regex::new(r"\d+\.").unwrap();
    if !marker.is_match(text) {
        return None;
    }

    let items: Vec<String> = marker
        .split(text)
        .skip(1) // text before the first marker is lead-in prose
        .filter_map(|piece| {
            let item = piece.lines().next().unwrap_or("").trim();
            let item = item.trim_end_matches(['.', ';', ',', ':']).trim();
            if item.is_empty() {
                None
            } else {
                Some(item.to_string())
            }
        })
        .collect();

    Some(items)
}

/// One bullet per line: `- item`, `* item`, `• item`
fn bulleted_items(text: &str) -> Option<Vec<String>> {
    let bullet = Regex::new(r"(?m)^\s*[-*•]\s+(.+)$").unwrap();
    let items: Vec<String> = bullet
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Last resort: split on sentence boundaries
fn sentence_items(text: &str) -> Option<Vec<String>> {
    let items: Vec<String> = text
        .split(['.', ';', '\n'])
        .map(|piece| piece.trim())
        .filter(|piece| !piece.is_empty() && *piece != ":")
        .map(|piece| piece.trim_start_matches(':').trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
