//! Conversation session state machine.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    ConversationHistory, Exchange, FailureKind, PromptBuilder, PromptContext, TRACING_TARGET,
};
use crate::persona::PersonalizationProfile;
use crate::provider::CompletionService;
use crate::rag::RetrievalEngine;

/// Session tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(clap::Args))]
#[serde(default)]
pub struct SessionConfig {
    /// Number of most recent exchanges included in each prompt.
    #[cfg_attr(
        feature = "config",
        arg(long = "history-window", env = "DOCENT_HISTORY_WINDOW", default_value_t = 5)
    )]
    pub history_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { history_window: 5 }
    }
}

/// One user's conversation: the exchange log and the current profile.
///
/// [`ask`](Self::ask) takes `&mut self`, so a session is a critical section
/// per question; share it across tasks behind a `tokio::sync::Mutex`.
#[derive(Debug)]
pub struct ConversationSession {
    id: Uuid,
    engine: RetrievalEngine,
    completions: CompletionService,
    profile: PersonalizationProfile,
    history: ConversationHistory,
    config: SessionConfig,
}

impl ConversationSession {
    /// Creates a session with the default profile and configuration.
    pub fn new(engine: RetrievalEngine, completions: CompletionService) -> Self {
        Self {
            id: Uuid::now_v7(),
            engine,
            completions,
            profile: PersonalizationProfile::default(),
            history: ConversationHistory::new(),
            config: SessionConfig::default(),
        }
    }

    /// Sets the initial profile.
    pub fn with_profile(mut self, profile: PersonalizationProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Sets the session configuration.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the retrieval engine.
    pub fn engine(&self) -> &RetrievalEngine {
        &self.engine
    }

    /// Returns the current profile.
    pub fn profile(&self) -> &PersonalizationProfile {
        &self.profile
    }

    /// Replaces the profile; the next question uses it.
    pub fn set_profile(&mut self, profile: PersonalizationProfile) {
        tracing::debug!(
            target: TRACING_TARGET,
            session_id = %self.id,
            profile = %profile,
            "Profile replaced"
        );
        self.profile = profile;
    }

    /// Returns every exchange, oldest first.
    pub fn history(&self) -> &[Exchange] {
        self.history.exchanges()
    }

    /// Returns the number of recorded exchanges.
    pub fn exchange_count(&self) -> usize {
        self.history.len()
    }

    /// Discards the exchange log; the profile is kept.
    pub fn clear_history(&mut self) {
        tracing::debug!(
            target: TRACING_TARGET,
            session_id = %self.id,
            discarded = self.history.len(),
            "History cleared"
        );
        self.history.clear();
    }

    /// Answers a question. Never fails: every failure becomes a recorded
    /// apology.
    pub async fn ask(&mut self, query: &str) -> String {
        let question = query.trim();
        if question.is_empty() {
            return self.record_failure(question, FailureKind::EmptyQuestion);
        }

        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            session_id = %self.id,
            question_len = question.len(),
            "Answering question"
        );

        let context = match self.retrieve(question).await {
            Ok(context) => context,
            Err(failure) => return self.record_failure(question, failure),
        };

        let prompt = PromptBuilder::new(&self.profile)
            .with_context(context)
            .with_history(self.history.recent(self.config.history_window))
            .with_question(question)
            .build();

        let answer = match self.completions.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_owned(),
            Ok(_) => return self.record_failure(question, FailureKind::EmptyResponse),
            Err(error) => return self.record_failure(question, FailureKind::from(&error)),
        };

        self.history.push(Exchange::new(question, answer.as_str()));

        tracing::info!(
            target: TRACING_TARGET,
            session_id = %self.id,
            exchanges = self.history.len(),
            answer_len = answer.len(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "Question answered"
        );

        answer
    }

    async fn retrieve(&self, question: &str) -> Result<PromptContext, FailureKind> {
        match self
            .engine
            .retrieve(question, self.engine.config().top_k)
            .await
        {
            Ok(chunks) if chunks.is_empty() => Ok(PromptContext::NoMatches),
            Ok(chunks) => Ok(PromptContext::Documents(chunks)),
            Err(error) if error.is_not_found() => Ok(PromptContext::NoDocuments),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    session_id = %self.id,
                    error = %error,
                    "Retrieval failed"
                );
                Err(FailureKind::Retrieval)
            }
        }
    }

    fn record_failure(&mut self, question: &str, failure: FailureKind) -> String {
        tracing::warn!(
            target: TRACING_TARGET,
            session_id = %self.id,
            failure = %failure,
            "Answering with apology"
        );

        let exchange = Exchange::failed(question, failure);
        let reply = exchange.assistant_text().to_owned();
        self.history.push(exchange);
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::NO_DOCUMENTS_CONTEXT;
    use crate::mock::{MockCompletionProvider, MockEmbeddingProvider};
    use crate::persona::{Preset, Style};
    use crate::provider::{
        ChatRole, CompletionError, EmbeddingErrorKind, EmbeddingService, LocalEmbeddingProvider,
        RetryPolicy,
    };
    use crate::rag::{Document, RagConfig};

    fn session_with(provider: &MockCompletionProvider) -> ConversationSession {
        let embeddings = EmbeddingService::new(LocalEmbeddingProvider::default());
        let engine = RetrievalEngine::new(embeddings, RagConfig::default()).unwrap();
        let completions = CompletionService::new(provider.clone()).with_retry(RetryPolicy::none());
        ConversationSession::new(engine, completions)
    }

    #[tokio::test]
    async fn answers_without_documents_using_sentinel() {
        let provider = MockCompletionProvider::new().with_reply("General answer.");
        let mut session = session_with(&provider);

        let answer = session.ask("What is a black hole?").await;

        assert_eq!(answer, "General answer.");
        assert_eq!(session.exchange_count(), 1);
        assert!(!session.history()[0].is_error());

        let prompt = provider.last_prompt().unwrap();
        assert!(prompt.system().unwrap().contains(NO_DOCUMENTS_CONTEXT));
        assert_eq!(prompt.last_user(), Some("What is a black hole?"));
    }

    #[tokio::test]
    async fn retrieved_context_reaches_prompt() {
        let provider = MockCompletionProvider::new();
        let mut session = session_with(&provider);
        session
            .engine()
            .ingest(&[Document::new(
                "river.txt",
                "The Nile is the longest river in Africa.",
            )])
            .await
            .unwrap();

        session.ask("Which river is the longest in Africa?").await;

        let system = provider.last_prompt().unwrap().system().unwrap().to_owned();
        assert!(system.contains("The Nile is the longest river in Africa."));
        assert!(!system.contains(NO_DOCUMENTS_CONTEXT));
    }

    #[tokio::test]
    async fn prompt_history_is_bounded_but_log_is_not() {
        let provider = MockCompletionProvider::new();
        let mut session = session_with(&provider);

        for i in 1..=7 {
            session.ask(&format!("question {i}")).await;
        }

        let prompt = provider.last_prompt().unwrap();
        assert_eq!(prompt.count(ChatRole::Assistant), 5);
        assert_eq!(prompt.count(ChatRole::User), 6);

        let users: Vec<&str> = prompt
            .messages()
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(users.first(), Some(&"question 2"));
        assert_eq!(users.last(), Some(&"question 7"));

        assert_eq!(session.history().len(), 7);
        assert_eq!(session.history()[0].user_text(), "question 1");
    }

    #[tokio::test]
    async fn clear_history_keeps_profile() {
        let provider = MockCompletionProvider::new();
        let mut session = session_with(&provider).with_profile(Preset::Expert.profile());

        session.ask("first").await;
        session.clear_history();

        assert!(session.history().is_empty());
        assert_eq!(session.profile(), &Preset::Expert.profile());

        let answer = session.ask("second").await;
        assert_eq!(answer, crate::mock::DEFAULT_MOCK_REPLY);
        assert_eq!(session.exchange_count(), 1);
        assert_eq!(provider.last_prompt().unwrap().count(ChatRole::Assistant), 0);
    }

    #[tokio::test]
    async fn set_profile_applies_to_next_question() {
        let provider = MockCompletionProvider::new();
        let mut session = session_with(&provider);

        session.ask("before").await;
        assert!(provider.last_prompt().unwrap().system().unwrap().contains("storytelling"));

        session.set_profile(Preset::Expert.profile());
        session.ask("after").await;

        let system = provider.last_prompt().unwrap().system().unwrap().to_owned();
        assert!(system.contains(&Style::BulletPoints.to_string()));
        assert!(system.contains("domain expert"));
    }

    #[tokio::test]
    async fn empty_response_becomes_recorded_apology() {
        let provider = MockCompletionProvider::new().with_reply("   ");
        let mut session = session_with(&provider);

        let answer = session.ask("hello?").await;

        assert_eq!(answer, FailureKind::EmptyResponse.apology());
        let exchange = &session.history()[0];
        assert!(exchange.is_error());
        assert_eq!(exchange.failure(), Some(FailureKind::EmptyResponse));
    }

    #[tokio::test]
    async fn completion_failure_becomes_apology() {
        let provider =
            MockCompletionProvider::new().with_failure(CompletionError::Auth("bad key".into()));
        let mut session = session_with(&provider);

        let answer = session.ask("hello?").await;

        assert_eq!(answer, FailureKind::Auth.apology());
        assert!(session.history()[0].is_error());
    }

    #[tokio::test]
    async fn retrieval_failure_skips_the_model() {
        let embedder = MockEmbeddingProvider::new(16).unwrap();
        let embeddings = EmbeddingService::with_retry(embedder.clone(), RetryPolicy::none());
        let engine = RetrievalEngine::new(embeddings, RagConfig::default()).unwrap();
        engine
            .ingest(&[Document::new("a.txt", "Some indexed text.")])
            .await
            .unwrap();

        let provider = MockCompletionProvider::new();
        let completions = CompletionService::new(provider.clone());
        let mut session = ConversationSession::new(engine, completions);

        embedder.fail_with(Some(EmbeddingErrorKind::Authentication));
        let answer = session.ask("anything indexed?").await;

        assert_eq!(answer, FailureKind::Retrieval.apology());
        assert_eq!(provider.call_count(), 0);
        assert_eq!(session.history()[0].failure(), Some(FailureKind::Retrieval));
    }

    #[tokio::test]
    async fn blank_question_is_recorded_without_model_call() {
        let provider = MockCompletionProvider::new();
        let mut session = session_with(&provider);

        let answer = session.ask("   ").await;

        assert_eq!(answer, FailureKind::EmptyQuestion.apology());
        assert_eq!(session.exchange_count(), 1);
        assert_eq!(session.history()[0].user_text(), "");
        assert_eq!(session.history()[0].failure(), Some(FailureKind::EmptyQuestion));
        assert_eq!(provider.call_count(), 0);
    }
}
