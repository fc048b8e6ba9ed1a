// Positional identifier reassignment for generated items
//
// Model-suggested identifiers are discarded entirely: every id is derived
// from the item's position in the (already-ordered) list, which makes
// reassignment idempotent and collision-free by construction.

use crate::models::{EpicItem, RequirementCategory, RequirementItem, ResponseContent, UserStoryItem};

/// Format an ordinal id like `REQ-001` / `EPIC-012`
fn format_item_id(prefix: &str, ordinal: usize) -> String {
    format!("{}-{:03}", prefix, ordinal)
}

/// Reassign requirement ids positionally.
///
/// The ordinal counts within each category sub-list, not globally:
/// functional items become `REQ-001..`, non-functional `REQ-NF-001..`, in
/// order of appearance. A missing or ambiguous category is treated as
/// functional and stamped so.
pub fn reassign_requirement_ids(items: &mut [RequirementItem]) {
    let mut functional = 0usize;
    let mut non_functional = 0usize;

    for item in items.iter_mut() {
        match item.category {
            Some(RequirementCategory::NonFunctional) => {
                non_functional += 1;
                item.id = format_item_id("REQ-NF", non_functional);
            }
            _ => {
                functional += 1;
                item.id = format_item_id("REQ", functional);
                item.category = Some(RequirementCategory::Functional);
            }
        }
    }
}

/// Reassign epic ids to `EPIC-###` sequentially
pub fn reassign_epic_ids(items: &mut [EpicItem]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.id = format_item_id("EPIC", index + 1);
    }
}

/// Reassign user story ids to `US-###` sequentially
pub fn reassign_story_ids(items: &mut [UserStoryItem]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.id = format_item_id("US", index + 1);
    }
}

/// Reassign identifiers for whichever item list the content holds.
/// Text content and already-merged buckets pass through untouched.
pub fn reassign_content_ids(content: &mut ResponseContent) {
    match content {
        ResponseContent::Requirements(items) => reassign_requirement_ids(items),
        ResponseContent::Epics(items) => reassign_epic_ids(items),
        ResponseContent::Stories(items) => reassign_story_ids(items),
        ResponseContent::Text(_) | ResponseContent::Buckets(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn requirement(id: &str, category: Option<RequirementCategory>) -> RequirementItem {
        RequirementItem {
            id: id.to_string(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            category,
            priority: Some(Priority::Medium),
        }
    }

    fn epic(id: &str) -> EpicItem {
        EpicItem {
            id: id.to_string(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            related_requirements: vec![],
        }
    }

    fn story(id: &str) -> UserStoryItem {
        UserStoryItem {
            id: id.to_string(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            priority: Some(Priority::High),
            assigned_epic: "EPIC-001".to_string(),
            acceptance_criteria: vec!["criterion".to_string()],
        }
    }

    #[test]
    fn test_requirements_numbered_per_category() {
        let mut items = vec![
            requirement("7", Some(RequirementCategory::Functional)),
            requirement("abc", Some(RequirementCategory::NonFunctional)),
            requirement("REQ-099", Some(RequirementCategory::Functional)),
            requirement("", Some(RequirementCategory::NonFunctional)),
        ];

        reassign_requirement_ids(&mut items);

        assert_eq!(items[0].id, "REQ-001");
        assert_eq!(items[1].id, "REQ-NF-001");
        assert_eq!(items[2].id, "REQ-002");
        assert_eq!(items[3].id, "REQ-NF-002");
    }

    #[test]
    fn test_missing_category_defaults_to_functional() {
        let mut items = vec![
            requirement("1", None),
            requirement("2", Some(RequirementCategory::NonFunctional)),
        ];

        reassign_requirement_ids(&mut items);

        assert_eq!(items[0].id, "REQ-001");
        assert_eq!(items[0].category, Some(RequirementCategory::Functional));
        assert_eq!(items[1].id, "REQ-NF-001");
    }

    #[test]
    fn test_epic_ids_sequential_and_padded() {
        let mut items: Vec<EpicItem> = (0..11).map(|i| epic(&format!("E{}", i))).collect();
        reassign_epic_ids(&mut items);
        assert_eq!(items[0].id, "EPIC-001");
        assert_eq!(items[9].id, "EPIC-010");
        assert_eq!(items[10].id, "EPIC-011");
    }

    #[test]
    fn test_story_ids_sequential() {
        let mut items = vec![story("US-9"), story("whatever")];
        reassign_story_ids(&mut items);
        assert_eq!(items[0].id, "US-001");
        assert_eq!(items[1].id, "US-002");
    }

    #[test]
    fn test_reassignment_is_idempotent() {
        let mut once = vec![
            requirement("3", Some(RequirementCategory::Functional)),
            requirement("1", Some(RequirementCategory::NonFunctional)),
            requirement("2", None),
        ];
        reassign_requirement_ids(&mut once);
        let mut twice = once.clone();
        reassign_requirement_ids(&mut twice);

        let ids_once: Vec<&str> = once.iter().map(|item| item.id.as_str()).collect();
        let ids_twice: Vec<&str> = twice.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids_once, ids_twice);
    }

    #[test]
    fn test_cross_references_preserved_verbatim() {
        let mut items = vec![UserStoryItem {
            assigned_epic: "EPIC-042".to_string(),
            ..story("US-1")
        }];
        reassign_story_ids(&mut items);
        // The story id changes, the epic reference does not
        assert_eq!(items[0].id, "US-001");
        assert_eq!(items[0].assigned_epic, "EPIC-042");
    }

    #[test]
    fn test_text_content_untouched() {
        let mut content = ResponseContent::Text("hola".to_string());
        reassign_content_ids(&mut content);
        match content {
            ResponseContent::Text(text) => assert_eq!(text, "hola"),
            _ => panic!("content variant changed"),
        }
    }
}
