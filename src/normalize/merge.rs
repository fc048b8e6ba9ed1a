// Merging of parallel and chunked generation results

use crate::models::{
    current_timestamp, EpicItem, NormalizedResponse, RequirementBuckets, RequirementCategory,
    RequirementItem, ResponseContent, ResponseStatus, UserStoryItem,
};
use crate::normalize::reconcile::{reassign_epic_ids, reassign_story_ids};
use std::collections::HashSet;

/// Merge the functional and non-functional requirement responses into one
/// combined envelope.
///
/// Item lists are pulled tolerantly (non-list content contributes an empty
/// list), concatenated, deduplicated by id (first occurrence wins, empty
/// ids dropped), and partitioned into functional / non-functional buckets
/// by the `REQ-NF-` prefix. The combined status is the most severe of the
/// two inputs, and their missing-info lists are united when that status is
/// insufficient-info.
pub fn merge_requirements(
    functional: &NormalizedResponse,
    non_functional: &NormalizedResponse,
) -> NormalizedResponse {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut buckets = RequirementBuckets::default();

    let combined = functional
        .content
        .requirement_items()
        .iter()
        .chain(non_functional.content.requirement_items());

    for item in combined {
        if item.id.is_empty() || seen_ids.contains(&item.id) {
            continue;
        }
        seen_ids.insert(item.id.clone());

        let mut item = item.clone();
        if item.id.starts_with("REQ-NF-") {
            item.category = Some(RequirementCategory::NonFunctional);
            buckets.non_functional.push(item);
        } else {
            item.category = Some(RequirementCategory::Functional);
            buckets.functional.push(item);
        }
    }

    let status = functional.status.most_severe(non_functional.status);

    let missing_info = if status == ResponseStatus::InsufficientInfo {
        let mut merged: Vec<String> = Vec::new();
        for source in [&functional.missing_info, &non_functional.missing_info] {
            if let Some(entries) = source {
                for entry in entries {
                    if !merged.contains(entry) {
                        merged.push(entry.clone());
                    }
                }
            }
        }
        Some(merged)
    } else {
        None
    };

    let query = if functional.query.is_empty() {
        non_functional.query.clone()
    } else {
        functional.query.clone()
    };

    let mut merged = NormalizedResponse {
        status,
        query,
        timestamp: current_timestamp(),
        content: ResponseContent::Buckets(buckets),
        missing_info,
        metadata: None,
    };
    merged.ensure_missing_info();
    merged
}

/// Split input items into fixed-size batches to bound prompt size.
/// The last batch may be shorter.
pub fn split_batches<T: Clone>(items: &[T], batch_size: usize) -> Vec<Vec<T>> {
    if batch_size == 0 {
        return vec![items.to_vec()];
    }
    items.chunks(batch_size).map(|chunk| chunk.to_vec()).collect()
}

/// Combine per-batch epic lists into one globally renumbered list.
///
/// Partial lists accumulate in batch order; identifiers are reassigned
/// once over the concatenation, so ids stay sequential across batch
/// boundaries instead of restarting at `EPIC-001` per batch.
pub fn merge_epic_chunks(chunks: Vec<Vec<EpicItem>>) -> Vec<EpicItem> {
    let mut items: Vec<EpicItem> = chunks.into_iter().flatten().collect();
    reassign_epic_ids(&mut items);
    items
}

/// Combine per-batch user story lists, same policy as epics
pub fn merge_story_chunks(chunks: Vec<Vec<UserStoryItem>>) -> Vec<UserStoryItem> {
    let mut items: Vec<UserStoryItem> = chunks.into_iter().flatten().collect();
    reassign_story_ids(&mut items);
    items
}
