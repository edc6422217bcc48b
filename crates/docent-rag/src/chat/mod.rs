//! Personalized conversation over ingested documents.
//!
//! A [`ConversationSession`] answers questions by retrieving context from a
//! [`RetrievalEngine`](crate::rag::RetrievalEngine), combining it with the
//! current [`PersonalizationProfile`](crate::persona::PersonalizationProfile)
//! and a bounded window of prior exchanges, and sending the result to a
//! [`CompletionService`](crate::provider::CompletionService).
//!
//! `ask` never fails: retrieval and model failures are turned into apology
//! replies, recorded in the history like any other turn.

mod exchange;
mod history;
mod prompt;
mod reply;
mod session;

pub use self::exchange::Exchange;
pub use self::history::ConversationHistory;
pub use self::prompt::{NO_DOCUMENTS_CONTEXT, NO_MATCHES_CONTEXT, PromptBuilder, PromptContext};
pub use self::reply::FailureKind;
pub use self::session::{ConversationSession, SessionConfig};

/// Tracing target for conversation operations.
pub const TRACING_TARGET: &str = "docent_rag::chat";
