//! Language model completion providers.

mod error;
mod prompt;
mod remote;
mod service;

use async_trait::async_trait;

pub use self::error::CompletionError;
pub use self::prompt::{ChatMessage, ChatPrompt, ChatRole};
pub use self::remote::RemoteCompletionProvider;
pub use self::service::CompletionService;

/// Result type for completion operations.
pub type Result<T, E = CompletionError> = std::result::Result<T, E>;

/// Capability interface for a chat-style language model.
///
/// A provider performs exactly one request per call and reports failures
/// through the typed [`CompletionError`]. Retries and the per-attempt timeout
/// are applied by [`CompletionService`].
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Identifier of the model.
    fn model_name(&self) -> &str;

    /// Name of the backend.
    fn provider_name(&self) -> &str;

    /// Sends the prompt and returns the generated text.
    ///
    /// The returned text may be empty; a response without any text content
    /// at all is a [`CompletionError::MalformedResponse`].
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String>;
}
