// Module declarations
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod normalize;
pub mod parsers;
pub mod session;

// Re-export the types most callers need
pub use config::EngineConfig;
pub use error::{EngineError, ExtractError};
pub use generation::{
    CompletionProvider, CompletionRequest, ContentEngine, ContextRetriever, GenerationOutcome,
    GenerationRequest, MessageRole, PromptMessage, ThinkingObserver,
};
pub use models::{
    EpicItem, GenerationKind, NormalizedResponse, Priority, RelatedRequirement,
    RequirementBuckets, RequirementCategory, RequirementItem, ResponseContent, ResponseStatus,
    UserStoryItem,
};
pub use session::{Session, SessionStore, Turn};
