// Seams to the external generation and retrieval capabilities
//
// The LLM and the vector store are collaborators, not parts of this crate:
// they are consumed through these traits and injected into the engine.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Role of a prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "system" => Ok(MessageRole::System),
            _ => Err(format!(
                "Invalid message role: '{}'. Expected 'user', 'assistant', or 'system'",
                s
            )),
        }
    }
}

/// One message of conversation history passed to the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

impl PromptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        PromptMessage {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        PromptMessage {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A fully assembled completion call: system instructions, prior
/// conversation turns, and the current user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub history: Vec<PromptMessage>,
    pub user: String,
}

/// The opaque completion capability: given a prompt and context, produce
/// text. Implementations wrap whatever model backend is in use.
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, request: &CompletionRequest)
        -> impl Future<Output = Result<String>> + Send;
}

/// The opaque retrieval capability: given a query, return the top-k
/// relevant text chunks in relevance order.
pub trait ContextRetriever: Send + Sync {
    fn retrieve(&self, query: &str, top_k: usize)
        -> impl Future<Output = Result<Vec<String>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_round_trip() {
        assert_eq!("user".parse::<MessageRole>().unwrap(), MessageRole::User);
        assert_eq!(
            "Assistant".parse::<MessageRole>().unwrap(),
            MessageRole::Assistant
        );
        assert_eq!(MessageRole::System.as_str(), "system");
        assert!("tool".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_prompt_message_constructors() {
        let message = PromptMessage::user("hola");
        assert_eq!(message.role, MessageRole::User);
        assert_eq!(message.content, "hola");

        let message = PromptMessage::assistant("respuesta");
        assert_eq!(message.role, MessageRole::Assistant);
    }
}
