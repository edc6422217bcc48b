//! Conversion of failures into user-facing replies.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::provider::CompletionError;

/// Why an exchange could not produce a model answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// The documents could not be searched.
    Retrieval,
    /// The language model did not answer in time.
    Timeout,
    /// The language model is throttling requests.
    RateLimited,
    /// The language model rejected the credentials.
    Auth,
    /// The language model answered with something unreadable.
    MalformedResponse,
    /// The language model service could not be reached.
    Unavailable,
    /// The language model refused the request.
    Rejected,
    /// The language model answered with no text.
    EmptyResponse,
    /// The question was blank.
    EmptyQuestion,
}

impl FailureKind {
    /// Returns the apology shown to the user for this failure.
    pub fn apology(self) -> &'static str {
        match self {
            Self::Retrieval => {
                "I apologize, but I could not search your documents right now. Please try again."
            }
            Self::Timeout => {
                "I apologize, but the language model took too long to respond. Please try again."
            }
            Self::RateLimited => {
                "I apologize, but the language model is receiving too many requests. Please wait a moment and try again."
            }
            Self::Auth => {
                "I apologize, but I could not authenticate with the language model service. Please check the API key."
            }
            Self::MalformedResponse => {
                "I apologize, but I received an invalid response format. Please try again."
            }
            Self::Unavailable => {
                "I apologize, but the language model service is currently unavailable. Please try again later."
            }
            Self::Rejected => {
                "I apologize, but the language model could not process this request. Please try rephrasing your question."
            }
            Self::EmptyResponse => {
                "I apologize, but I received an empty response. Please try again."
            }
            Self::EmptyQuestion => {
                "I apologize, but your question was empty. Please type a question about your documents."
            }
        }
    }
}

impl From<&CompletionError> for FailureKind {
    fn from(error: &CompletionError) -> Self {
        match error {
            CompletionError::Timeout { .. } => Self::Timeout,
            CompletionError::RateLimited { .. } => Self::RateLimited,
            CompletionError::Auth(_) => Self::Auth,
            CompletionError::MalformedResponse(_) => Self::MalformedResponse,
            CompletionError::Unavailable { .. } => Self::Unavailable,
            CompletionError::Rejected { .. } => Self::Rejected,
        }
    }
}
