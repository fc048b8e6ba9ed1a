// Data models for normalized assistant responses and generated artifacts

use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};

/// Timestamp format used across responses and the session log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder synthesized when an insufficient-info response carries no
/// usable missing-info list
pub const MISSING_INFO_PLACEHOLDER: &str = "Se requieren más detalles sobre el proyecto";

/// Current wall-clock timestamp in the canonical format
pub fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

// ============================================================================
// Response Status
// ============================================================================

/// Status taxonomy for normalized responses.
///
/// Wire values are the canonical Spanish status strings. The per-kind
/// generated statuses the model is prompted with (`EPICAS_GENERADAS`,
/// `HISTORIAS_GENERADAS`) collapse onto `Generated` on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(
        rename = "REQUERIMIENTOS_GENERADOS",
        alias = "EPICAS_GENERADAS",
        alias = "HISTORIAS_GENERADAS"
    )]
    Generated,
    #[serde(
        rename = "INFORMACION_INSUFICIENTE",
        alias = "INSUFFICIENT_INFORMATION"
    )]
    InsufficientInfo,
    #[serde(rename = "ERROR_PROCESAMIENTO")]
    ProcessingError,
    #[serde(rename = "RESPUESTA_GENERAL")]
    General,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Generated => "REQUERIMIENTOS_GENERADOS",
            ResponseStatus::InsufficientInfo => "INFORMACION_INSUFICIENTE",
            ResponseStatus::ProcessingError => "ERROR_PROCESAMIENTO",
            ResponseStatus::General => "RESPUESTA_GENERAL",
        }
    }

    /// Rank used when merging partial results: the most severe status wins
    pub fn severity(&self) -> u8 {
        match self {
            ResponseStatus::ProcessingError => 3,
            ResponseStatus::InsufficientInfo => 2,
            ResponseStatus::Generated => 1,
            ResponseStatus::General => 0,
        }
    }

    /// The more severe of two statuses
    pub fn most_severe(self, other: ResponseStatus) -> ResponseStatus {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResponseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "REQUERIMIENTOS_GENERADOS" | "EPICAS_GENERADAS" | "HISTORIAS_GENERADAS" => {
                Ok(ResponseStatus::Generated)
            }
            "INFORMACION_INSUFICIENTE" | "INSUFFICIENT_INFORMATION" => {
                Ok(ResponseStatus::InsufficientInfo)
            }
            "ERROR_PROCESAMIENTO" => Ok(ResponseStatus::ProcessingError),
            "RESPUESTA_GENERAL" => Ok(ResponseStatus::General),
            _ => Err(format!(
                "Invalid response status: '{}'. Expected 'REQUERIMIENTOS_GENERADOS', 'INFORMACION_INSUFICIENTE', 'ERROR_PROCESAMIENTO', or 'RESPUESTA_GENERAL'",
                s
            )),
        }
    }
}

// ============================================================================
// Item Enums
// ============================================================================

/// Item priority. Wire values are the Spanish forms the original assistant
/// emits; the English spellings used by the prompt examples parse too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    #[serde(rename = "Alta")]
    High,
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Baja")]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "Alta",
            Priority::Medium => "Media",
            Priority::Low => "Baja",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alta" | "high" => Ok(Priority::High),
            "media" | "medium" => Ok(Priority::Medium),
            "baja" | "low" => Ok(Priority::Low),
            _ => Err(format!(
                "Invalid priority: '{}'. Expected 'Alta', 'Media', or 'Baja'",
                s
            )),
        }
    }
}

/// Requirement category. Wire values follow the original assistant output
/// ('Funcional' / 'No Funcional').
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequirementCategory {
    #[serde(rename = "Funcional")]
    Functional,
    #[serde(rename = "No Funcional")]
    NonFunctional,
}

impl RequirementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementCategory::Functional => "Funcional",
            RequirementCategory::NonFunctional => "No Funcional",
        }
    }
}

impl std::fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RequirementCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "nf"
            || lower.contains("no funcional")
            || lower.contains("non functional")
            || lower.contains("non-functional")
            || lower.contains("nonfunctional")
        {
            Ok(RequirementCategory::NonFunctional)
        } else if lower.contains("funcional") || lower.contains("functional") {
            Ok(RequirementCategory::Functional)
        } else {
            Err(format!(
                "Invalid requirement category: '{}'. Expected 'Funcional' or 'No Funcional'",
                s
            ))
        }
    }
}

/// Deserialize an optional priority tolerantly: unrecognized or missing
/// values become `None` instead of failing the whole item.
fn de_opt_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse::<Priority>().ok()))
}

/// Deserialize an optional category tolerantly, same policy as priority.
/// A missing or ambiguous category is resolved to Functional later, during
/// identifier reconciliation.
fn de_opt_category<'de, D>(deserializer: D) -> Result<Option<RequirementCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse::<RequirementCategory>().ok()))
}

// ============================================================================
// Generated Items
// ============================================================================

/// A single generated requirement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, deserialize_with = "de_opt_category")]
    pub category: Option<RequirementCategory>,
    #[serde(default, deserialize_with = "de_opt_priority")]
    pub priority: Option<Priority>,
}

/// A requirement reference carried by an epic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedRequirement {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// A single generated epic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: String,
    /// References into the requirement result set. Preserved verbatim:
    /// dangling ids are not validated against existence.
    #[serde(default)]
    pub related_requirements: Vec<RelatedRequirement>,
}

/// A single generated user story
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStoryItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, deserialize_with = "de_opt_priority")]
    pub priority: Option<Priority>,
    /// Foreign identifier into epic space, preserved verbatim
    #[serde(default)]
    pub assigned_epic: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

/// Functional / non-functional requirement buckets produced by the
/// requirements merge. Wire keys match the original combined payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequirementBuckets {
    #[serde(rename = "funcionales")]
    pub functional: Vec<RequirementItem>,
    #[serde(rename = "no_funcionales")]
    pub non_functional: Vec<RequirementItem>,
}

impl RequirementBuckets {
    /// Both buckets flattened, functional items first
    pub fn all_items(&self) -> Vec<RequirementItem> {
        self.functional
            .iter()
            .chain(self.non_functional.iter())
            .cloned()
            .collect()
    }
}

// ============================================================================
// Normalized Response
// ============================================================================

/// Content of a normalized response: free text, one of the typed item
/// lists, or the merged requirement buckets. Serializes untagged, so the
/// wire shape is a plain string, array, or object.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseContent {
    Text(String),
    Requirements(Vec<RequirementItem>),
    Epics(Vec<EpicItem>),
    Stories(Vec<UserStoryItem>),
    Buckets(RequirementBuckets),
}

impl ResponseContent {
    /// Requirement items when content is a requirement list, empty otherwise
    pub fn requirement_items(&self) -> &[RequirementItem] {
        match self {
            ResponseContent::Requirements(items) => items,
            _ => &[],
        }
    }

    /// Epic items when content is an epic list, empty otherwise
    pub fn epic_items(&self) -> &[EpicItem] {
        match self {
            ResponseContent::Epics(items) => items,
            _ => &[],
        }
    }

    /// Story items when content is a story list, empty otherwise
    pub fn story_items(&self) -> &[UserStoryItem] {
        match self {
            ResponseContent::Stories(items) => items,
            _ => &[],
        }
    }

    /// Number of generated items, 0 for text content
    pub fn item_count(&self) -> usize {
        match self {
            ResponseContent::Text(_) => 0,
            ResponseContent::Requirements(items) => items.len(),
            ResponseContent::Epics(items) => items.len(),
            ResponseContent::Stories(items) => items.len(),
            ResponseContent::Buckets(buckets) => {
                buckets.functional.len() + buckets.non_functional.len()
            }
        }
    }
}

/// The stable response envelope returned to callers and recorded in the
/// session history
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedResponse {
    pub status: ResponseStatus,
    pub query: String,
    pub timestamp: String,
    pub content: ResponseContent,
    pub missing_info: Option<Vec<String>>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl NormalizedResponse {
    /// Build a text-content response with the current timestamp
    pub fn text(status: ResponseStatus, query: impl Into<String>, text: impl Into<String>) -> Self {
        NormalizedResponse {
            status,
            query: query.into(),
            timestamp: current_timestamp(),
            content: ResponseContent::Text(text.into()),
            missing_info: None,
            metadata: None,
        }
    }

    /// Enforce the invariant that an insufficient-info response always
    /// carries a non-empty missing-info list
    pub fn ensure_missing_info(&mut self) {
        if self.status == ResponseStatus::InsufficientInfo
            && self.missing_info.as_ref().map_or(true, |m| m.is_empty())
        {
            self.missing_info = Some(vec![MISSING_INFO_PLACEHOLDER.to_string()]);
        }
    }

    /// Serialize to the pretty JSON wire form stored in session history
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// Generation Kind
// ============================================================================

/// The artifact flavor a generation call produces. Replaces the original
/// stringly-typed dispatch with a closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Requirements,
    Epics,
    UserStories,
}

impl GenerationKind {
    pub fn all() -> &'static [GenerationKind] {
        &[
            GenerationKind::Requirements,
            GenerationKind::Epics,
            GenerationKind::UserStories,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Requirements => "requirements",
            GenerationKind::Epics => "epics",
            GenerationKind::UserStories => "user_stories",
        }
    }
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GenerationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "requirements" | "requerimientos" => Ok(GenerationKind::Requirements),
            "epics" | "epicas" => Ok(GenerationKind::Epics),
            "user_stories" | "userstories" | "historias_usuario" => Ok(GenerationKind::UserStories),
            _ => Err(format!(
                "Invalid generation kind: '{}'. Expected 'requirements', 'epics', or 'user_stories'",
                s
            )),
        }
    }
}
