// Conversation sessions: in-memory state and durable text-file history

pub mod history_file;
pub mod store;

pub use store::SessionStore;

use serde::{Deserialize, Serialize};

/// One query/response exchange within a session.
///
/// Turns are created whole, after a full result has been produced; a
/// request abandoned mid-flight leaves no partial turn behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    /// Normalized response as stored and returned to callers
    pub response: String,
    pub timestamp: String,
    /// Original unprocessed model output. Empty for turns reloaded from
    /// disk, which only persist the normalized form.
    #[serde(default)]
    pub raw_response: String,
}

/// A named, ordered sequence of turns plus the context retrieved for the
/// most recent query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub turns: Vec<Turn>,
    pub last_context: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Session {
            id: id.into(),
            turns: Vec::new(),
            last_context: None,
        }
    }
}
