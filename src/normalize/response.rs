// Raw model output to normalized response envelope

use crate::models::{
    current_timestamp, EpicItem, GenerationKind, NormalizedResponse, RequirementItem,
    ResponseContent, ResponseStatus, UserStoryItem,
};
use crate::normalize::reconcile::reassign_content_ids;
use crate::parsers::{classify_text, extract_json, harvest_missing_info};
use serde_json::Value;

/// Turns raw model output into the stable response envelope.
///
/// Extraction and parse failures are downgraded, never surfaced: a response
/// that cannot be read as structured JSON is classified heuristically from
/// the raw text. The processor always returns a well-formed envelope.
pub struct ResponseProcessor;

impl ResponseProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Process one raw model answer for the given artifact kind
    pub fn process(&self, kind: GenerationKind, raw_answer: &str, query: &str) -> NormalizedResponse {
        match extract_json(raw_answer) {
            Ok(json_str) => match serde_json::from_str::<Value>(&json_str) {
                Ok(value) => self.from_structured(kind, value, raw_answer, query),
                Err(e) => {
                    log::warn!("Extracted JSON failed to parse, falling back to heuristics: {}", e);
                    self.from_raw_text(raw_answer, query)
                }
            },
            Err(_) => self.from_raw_text(raw_answer, query),
        }
    }

    /// Structured path: a JSON payload was extracted and parsed
    fn from_structured(
        &self,
        kind: GenerationKind,
        value: Value,
        raw_answer: &str,
        query: &str,
    ) -> NormalizedResponse {
        let content_value = value
            .get("content")
            .cloned()
            .unwrap_or_else(|| Value::String(raw_answer.to_string()));

        let mut content = decode_content(kind, content_value);

        let explicit_status = value
            .get("status")
            .and_then(|status| status.as_str())
            .and_then(|status| status.parse::<ResponseStatus>().ok());

        let status = explicit_status.unwrap_or_else(|| match &content {
            // A list of items is generated content by construction
            ResponseContent::Requirements(_)
            | ResponseContent::Epics(_)
            | ResponseContent::Stories(_)
            | ResponseContent::Buckets(_) => ResponseStatus::Generated,
            ResponseContent::Text(text) => classify_text(text),
        });

        let mut missing_info = value.get("missing_info").and_then(string_list);

        if status == ResponseStatus::InsufficientInfo
            && missing_info.as_ref().map_or(true, |m| m.is_empty())
        {
            if let ResponseContent::Text(text) = &content {
                missing_info = harvest_missing_info(text);
            }
        }

        let metadata = value
            .get("metadata")
            .and_then(|metadata| metadata.as_object())
            .cloned();

        reassign_content_ids(&mut content);

        let mut response = NormalizedResponse {
            status,
            query: query.to_string(),
            timestamp: current_timestamp(),
            content,
            missing_info,
            metadata,
        };
        response.ensure_missing_info();
        response
    }

    /// Fallback path: no JSON payload could be extracted or parsed
    fn from_raw_text(&self, raw_answer: &str, query: &str) -> NormalizedResponse {
        let status = classify_text(raw_answer);

        let missing_info = if status == ResponseStatus::InsufficientInfo {
            harvest_missing_info(raw_answer)
        } else {
            None
        };

        let mut response = NormalizedResponse {
            status,
            query: query.to_string(),
            timestamp: current_timestamp(),
            content: ResponseContent::Text(raw_answer.to_string()),
            missing_info,
            metadata: None,
        };
        response.ensure_missing_info();
        response
    }
}

impl Default for ResponseProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the content field for the requested artifact kind.
///
/// Array content parses element-wise into the kind's item type; elements
/// that do not fit the item shape are dropped rather than failing the
/// response. Non-array, non-string content degrades to its JSON text.
fn decode_content(kind: GenerationKind, value: Value) -> ResponseContent {
    match value {
        Value::String(text) => ResponseContent::Text(text),
        Value::Array(elements) => match kind {
            GenerationKind::Requirements => ResponseContent::Requirements(decode_items::<
                RequirementItem,
            >(elements)),
            GenerationKind::Epics => ResponseContent::Epics(decode_items::<EpicItem>(elements)),
            GenerationKind::UserStories => {
                ResponseContent::Stories(decode_items::<UserStoryItem>(elements))
            }
        },
        other => ResponseContent::Text(other.to_string()),
    }
}

fn decode_items<T: serde::de::DeserializeOwned>(elements: Vec<Value>) -> Vec<T> {
    elements
        .into_iter()
        .filter_map(|element| serde_json::from_value::<T>(element).ok())
        .collect()
}

/// Pull an optional list of strings out of a JSON value
fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|entries| {
        entries
            .iter()
            .filter_map(|entry| entry.as_str())
            .map(|entry| entry.to_string())
            .collect()
    })
}
