//! Scripted providers for tests.
//!
//! Available under `cfg(test)` and with the `mock` feature so that
//! downstream crates can drive a [`ConversationSession`] without network
//! access.
//!
//! [`ConversationSession`]: crate::chat::ConversationSession

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::provider::completion::Result as CompletionResult;
use crate::provider::embedding::Result as EmbeddingResult;
use crate::provider::{
    ChatPrompt, CompletionError, CompletionProvider, EmbeddingError, EmbeddingErrorKind,
    EmbeddingProvider, LocalEmbeddingProvider,
};

/// Reply used once the script runs out.
pub const DEFAULT_MOCK_REPLY: &str = "mock reply";

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<CompletionResult<String>>,
    prompts: Vec<ChatPrompt>,
}

/// Completion provider that replays scripted outcomes and records prompts.
///
/// Clones share the same script and recording, so a test can keep one
/// handle while the service owns another.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionProvider {
    state: Arc<Mutex<MockState>>,
    delay: Option<Duration>,
}

impl MockCompletionProvider {
    /// Creates a provider that answers [`DEFAULT_MOCK_REPLY`] to everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.state().script.push_back(Ok(reply.into()));
        self
    }

    /// Queues a failure.
    pub fn with_failure(self, error: CompletionError) -> Self {
        self.state().script.push_back(Err(error));
        self
    }

    /// Delays every reply by the given duration.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns every prompt received so far.
    pub fn prompts(&self) -> Vec<ChatPrompt> {
        self.state().prompts.clone()
    }

    /// Returns the most recent prompt.
    pub fn last_prompt(&self) -> Option<ChatPrompt> {
        self.state().prompts.last().cloned()
    }

    /// Returns the number of completion calls.
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &ChatPrompt) -> CompletionResult<String> {
        let outcome = {
            let mut state = self.state();
            state.prompts.push(prompt.clone());
            state.script.pop_front()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        outcome.unwrap_or_else(|| Ok(DEFAULT_MOCK_REPLY.to_owned()))
    }
}

/// Embedding provider that delegates to the hashing embedder and can be
/// switched into a failing mode.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    inner: Arc<LocalEmbeddingProvider>,
    failure: Arc<Mutex<Option<EmbeddingErrorKind>>>,
}

impl MockEmbeddingProvider {
    /// Creates a provider with the given dimension.
    pub fn new(dimensions: usize) -> EmbeddingResult<Self> {
        Ok(Self {
            inner: Arc::new(LocalEmbeddingProvider::hashing(dimensions)?),
            failure: Arc::default(),
        })
    }

    /// Makes every following call fail with `kind`, or succeed again with `None`.
    pub fn fail_with(&self, kind: Option<EmbeddingErrorKind>) {
        *self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = kind;
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let failure = *self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match failure {
            Some(kind) => Err(EmbeddingError::new(kind).with_message("scripted failure")),
            None => self.inner.embed_batch(texts).await,
        }
    }
}
