// Content generation pipeline: provider seams, prompt assembly, thinking
// steps, the per-call engine, and the multi-call workflows

pub mod engine;
pub mod prompts;
pub mod provider;
pub mod thinking;
mod workflow;

pub use engine::{ContentEngine, GenerationOutcome, GenerationRequest};
pub use prompts::{
    PromptEngine, EPICS_PROMPT, FUNCTIONAL_REQUIREMENTS_PROMPT,
    NON_FUNCTIONAL_REQUIREMENTS_PROMPT, USER_STORY_PROMPT,
};
pub use provider::{CompletionProvider, CompletionRequest, ContextRetriever, MessageRole, PromptMessage};
pub use thinking::{ThinkingObserver, ThinkingSteps};
