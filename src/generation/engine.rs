// Per-call generation pipeline

use super::prompts::{user_prompt, PromptEngine};
use super::provider::{CompletionProvider, CompletionRequest, ContextRetriever, PromptMessage};
use super::thinking::ThinkingSteps;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::{GenerationKind, NormalizedResponse};
use crate::normalize::ResponseProcessor;
use crate::session::{SessionStore, Turn};
use std::sync::Arc;
use std::time::Duration;

/// One generation call: what to ask, which artifact kind to produce, and
/// which session to attach the exchange to
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub query: String,
    pub kind: GenerationKind,
    /// Base instruction prepended to the system prompt
    pub preprompt: String,
    /// Absent or unknown ids create a fresh session
    pub session_id: Option<String>,
    /// Start a new conversation: prior history is not sent to the model
    pub new_chat: bool,
}

impl GenerationRequest {
    /// Request with the default base prompt for the kind
    pub fn new(kind: GenerationKind, query: impl Into<String>) -> Self {
        GenerationRequest {
            query: query.into(),
            kind,
            preprompt: super::prompts::base_prompt(kind).to_string(),
            session_id: None,
            new_chat: false,
        }
    }

    pub fn with_preprompt(mut self, preprompt: impl Into<String>) -> Self {
        self.preprompt = preprompt.into();
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn new_chat(mut self, new_chat: bool) -> Self {
        self.new_chat = new_chat;
        self
    }
}

/// Result of a generation call: the session it ran in and the normalized
/// response
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub session_id: String,
    pub response: NormalizedResponse,
}

/// Orchestrates session resolution, context retrieval, prompt assembly,
/// the completion call, normalization, and history recording.
///
/// Constructed explicitly with its collaborators; there is no global
/// engine instance.
pub struct ContentEngine<P, R> {
    provider: P,
    retriever: R,
    store: Arc<SessionStore>,
    prompts: PromptEngine,
    processor: ResponseProcessor,
    thinking: ThinkingSteps,
    config: EngineConfig,
}

impl<P, R> ContentEngine<P, R>
where
    P: CompletionProvider,
    R: ContextRetriever,
{
    pub fn new(
        provider: P,
        retriever: R,
        store: Arc<SessionStore>,
        config: EngineConfig,
    ) -> Result<Self, String> {
        config.validate()?;
        let thinking = ThinkingSteps::new(Duration::from_millis(config.thinking_pace_ms));
        Ok(ContentEngine {
            provider,
            retriever,
            store,
            prompts: PromptEngine::new()?,
            processor: ResponseProcessor::new(),
            thinking,
            config,
        })
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one full generation call.
    ///
    /// Upstream completion/retrieval failures are the only errors returned;
    /// unparseable model output and persistence problems are recovered
    /// locally, and the caller always gets a normalized response for them.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, EngineError> {
        let session_id = self.store.create_or_get(request.session_id.as_deref());

        self.thinking.step("Analizando la consulta", 1.5).await;
        let context_chunks = self
            .retriever
            .retrieve(&request.query, self.config.retrieval_top_k)
            .await
            .map_err(EngineError::Retrieval)?;

        self.thinking
            .step("Buscando información relevante en la base de conocimiento", 2.0)
            .await;
        let system = self
            .prompts
            .render_system_prompt(request.kind, &request.preprompt, &context_chunks)
            .map_err(EngineError::Prompt)?;

        let history = if request.new_chat {
            Vec::new()
        } else {
            history_messages(&self.store.history(&session_id))
        };

        let completion_request = CompletionRequest {
            system,
            history,
            user: user_prompt(&request.query),
        };

        self.thinking
            .step("Procesando documentos recuperados y generando respuesta", 2.5)
            .await;
        let raw_answer = self
            .provider
            .complete(&completion_request)
            .await
            .map_err(EngineError::Upstream)?;

        self.thinking.step("Analizando la información recuperada", 1.2).await;
        let response = self.processor.process(request.kind, &raw_answer, &request.query);
        self.thinking
            .step("Sintetizando respuesta basada en el conocimiento disponible", 1.5)
            .await;

        self.record_turn(&session_id, &request.query, &response, &raw_answer);
        self.store
            .set_last_context(&session_id, context_chunks.join("\n\n"));
        self.store.persist(&session_id);

        self.thinking.complete().await;

        Ok(GenerationOutcome {
            session_id,
            response,
        })
    }

    /// Append a completed exchange to the session history. The turn is
    /// recorded whole: a request that fails earlier leaves no trace here.
    pub(crate) fn record_turn(
        &self,
        session_id: &str,
        query: &str,
        response: &NormalizedResponse,
        raw_answer: &str,
    ) {
        let serialized = response.to_json().unwrap_or_else(|e| {
            log::error!("Failed to serialize normalized response: {}", e);
            raw_answer.to_string()
        });

        self.store.append_turn(
            session_id,
            Turn {
                query: query.to_string(),
                response: serialized,
                timestamp: response.timestamp.clone(),
                raw_response: raw_answer.to_string(),
            },
        );
    }
}

/// Project session turns into provider history messages
fn history_messages(turns: &[Turn]) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(turns.len() * 2);
    for turn in turns {
        messages.push(PromptMessage::user(turn.query.clone()));
        messages.push(PromptMessage::assistant(turn.response.clone()));
    }
    messages
}
