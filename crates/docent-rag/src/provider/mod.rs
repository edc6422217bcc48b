//! Embedding and language-model providers.
//!
//! Both capabilities follow the same shape: an object-safe provider trait
//! implemented by the concrete backends, and a cheaply cloneable service
//! wrapper that adds output validation, bounded retries and structured
//! logging on top of any provider.
//!
//! | capability | trait | service | backends |
//! |---|---|---|---|
//! | embeddings | [`EmbeddingProvider`] | [`EmbeddingService`] | [`LocalEmbeddingProvider`], [`RemoteEmbeddingProvider`] |
//! | completions | [`CompletionProvider`] | [`CompletionService`] | [`RemoteCompletionProvider`] |

pub mod completion;
mod config;
pub mod embedding;
mod http;
mod retry;

pub use self::completion::{
    ChatMessage, ChatPrompt, ChatRole, CompletionError, CompletionProvider, CompletionService,
    RemoteCompletionProvider,
};
pub use self::config::{RemoteConfig, RemoteConfigBuilder, RemoteConfigBuilderError};
pub use self::embedding::{
    EmbeddingError, EmbeddingErrorKind, EmbeddingProvider, EmbeddingService,
    LocalEmbeddingProvider, RemoteEmbeddingProvider,
};
pub use self::retry::{RetryPolicy, Retryable};

/// Tracing target for provider operations.
pub const TRACING_TARGET: &str = "docent_rag::provider";
