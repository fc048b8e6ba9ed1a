// Multi-call generation workflows: dual requirements calls and chunked
// epic/user-story batches

use super::engine::{ContentEngine, GenerationOutcome, GenerationRequest};
use super::prompts::{
    format_epic_group_input, format_requirements_input, EPICS_PROMPT,
    FUNCTIONAL_REQUIREMENTS_PROMPT, NON_FUNCTIONAL_REQUIREMENTS_PROMPT, USER_STORY_PROMPT,
};
use super::provider::{CompletionProvider, ContextRetriever};
use crate::error::EngineError;
use crate::models::{
    current_timestamp, EpicItem, GenerationKind, NormalizedResponse, RequirementItem,
    ResponseContent, ResponseStatus, UserStoryItem,
};
use crate::normalize::{merge_epic_chunks, merge_requirements, merge_story_chunks, split_batches};

impl<P, R> ContentEngine<P, R>
where
    P: CompletionProvider,
    R: ContextRetriever,
{
    /// Generate functional and non-functional requirements for a project
    /// description and merge them into one bucketed response.
    ///
    /// The two calls run strictly sequentially in the same session, each
    /// recording its own turn; the merged envelope is what the caller
    /// receives.
    pub async fn generate_requirements(
        &self,
        description: &str,
        session_id: Option<&str>,
        new_chat: bool,
    ) -> Result<GenerationOutcome, EngineError> {
        let mut request = GenerationRequest::new(GenerationKind::Requirements, description)
            .with_preprompt(FUNCTIONAL_REQUIREMENTS_PROMPT)
            .new_chat(new_chat);
        if let Some(id) = session_id {
            request = request.with_session(id);
        }
        let functional = self.generate(request).await?;

        let non_functional = self
            .generate(
                GenerationRequest::new(GenerationKind::Requirements, description)
                    .with_preprompt(NON_FUNCTIONAL_REQUIREMENTS_PROMPT)
                    .with_session(functional.session_id.clone()),
            )
            .await?;

        let merged = merge_requirements(&functional.response, &non_functional.response);

        Ok(GenerationOutcome {
            session_id: non_functional.session_id,
            response: merged,
        })
    }

    /// Generate epics from a requirement list, batching the input to bound
    /// prompt size and renumbering ids across batches.
    pub async fn generate_epics(
        &self,
        requirements: &[RequirementItem],
        session_id: Option<&str>,
        new_chat: bool,
    ) -> Result<GenerationOutcome, EngineError> {
        let batches = split_batches(requirements, self.config().batch_size);

        let mut run = ChunkRun::new(session_id, new_chat);
        let mut chunks: Vec<Vec<EpicItem>> = Vec::new();

        for batch in &batches {
            let request = run.request(GenerationKind::Epics, format_requirements_input(batch))
                .with_preprompt(EPICS_PROMPT);
            let outcome = self.generate(request).await?;
            chunks.push(outcome.response.content.epic_items().to_vec());
            run.absorb(outcome);
        }

        let items = merge_epic_chunks(chunks);
        let query = format_requirements_input(requirements);
        self.finish_chunked(run, query, ResponseContent::Epics(items))
    }

    /// Generate user stories from an epic list, batching the input and
    /// renumbering ids across batches.
    pub async fn generate_user_stories(
        &self,
        epics: &[EpicItem],
        session_id: Option<&str>,
        new_chat: bool,
    ) -> Result<GenerationOutcome, EngineError> {
        let batches = split_batches(epics, self.config().batch_size);

        let mut run = ChunkRun::new(session_id, new_chat);
        let mut chunks: Vec<Vec<UserStoryItem>> = Vec::new();

        for batch in &batches {
            let request = run.request(GenerationKind::UserStories, format_epic_group_input(batch))
                .with_preprompt(USER_STORY_PROMPT);
            let outcome = self.generate(request).await?;
            chunks.push(outcome.response.content.story_items().to_vec());
            run.absorb(outcome);
        }

        let items = merge_story_chunks(chunks);
        let query = format_epic_group_input(epics);
        self.finish_chunked(run, query, ResponseContent::Stories(items))
    }

    /// Assemble the combined envelope for a chunked run, record it as one
    /// final turn, and persist the session.
    fn finish_chunked(
        &self,
        run: ChunkRun,
        query: String,
        content: ResponseContent,
    ) -> Result<GenerationOutcome, EngineError> {
        let session_id = match run.session {
            Some(id) => id,
            // No batches ran (empty input): still anchor the result to a
            // session so the caller can continue the conversation
            None => self.store().create_or_get(None),
        };

        let status = run.status.unwrap_or(ResponseStatus::Generated);
        let missing_info = if status == ResponseStatus::InsufficientInfo
            && !run.missing_info.is_empty()
        {
            Some(run.missing_info)
        } else {
            None
        };

        let mut combined = NormalizedResponse {
            status,
            query: query.clone(),
            timestamp: current_timestamp(),
            content,
            missing_info,
            metadata: None,
        };
        combined.ensure_missing_info();

        // Synthetic merged turn: there is no single raw model output
        self.record_turn(&session_id, &query, &combined, "");
        self.store().persist(&session_id);

        Ok(GenerationOutcome {
            session_id,
            response: combined,
        })
    }
}

/// Per-run bookkeeping for a chunked workflow: session threading, status
/// folding, and missing-info accumulation across batches
struct ChunkRun {
    session: Option<String>,
    first_call: bool,
    status: Option<ResponseStatus>,
    missing_info: Vec<String>,
}

impl ChunkRun {
    fn new(session_id: Option<&str>, new_chat: bool) -> Self {
        ChunkRun {
            session: session_id.map(str::to_string),
            first_call: new_chat,
            status: None,
            missing_info: Vec::new(),
        }
    }

    /// Build the request for the next batch in the run
    fn request(&self, kind: GenerationKind, query: String) -> GenerationRequest {
        let mut request = GenerationRequest::new(kind, query).new_chat(self.first_call);
        if let Some(id) = &self.session {
            request = request.with_session(id.clone());
        }
        request
    }

    /// Fold one batch outcome into the run state
    fn absorb(&mut self, outcome: GenerationOutcome) {
        self.first_call = false;
        self.session = Some(outcome.session_id);
        self.status = Some(match self.status {
            None => outcome.response.status,
            Some(current) => current.most_severe(outcome.response.status),
        });
        if let Some(entries) = outcome.response.missing_info {
            for entry in entries {
                if !self.missing_info.contains(&entry) {
                    self.missing_info.push(entry);
                }
            }
        }
    }
}
