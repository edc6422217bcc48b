//! A single question and answer turn.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FailureKind;

/// One recorded turn of a conversation.
///
/// Exchanges are immutable once created. Failed turns are recorded too:
/// their assistant text is the apology that was shown, and
/// [`failure`](Self::failure) names the cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    id: Uuid,
    user_text: String,
    assistant_text: String,
    timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<FailureKind>,
}

impl Exchange {
    /// Creates a successful exchange.
    pub fn new(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            timestamp: Timestamp::now(),
            failure: None,
        }
    }

    /// Creates a failed exchange whose answer is the apology for `failure`.
    pub fn failed(user_text: impl Into<String>, failure: FailureKind) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(user_text, failure.apology())
        }
    }

    /// Returns the unique identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the user's question.
    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    /// Returns the assistant's answer (or apology).
    pub fn assistant_text(&self) -> &str {
        &self.assistant_text
    }

    /// Returns when the exchange was recorded.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns the failure cause, if the turn failed.
    pub fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    /// Returns true if the assistant text is an apology.
    pub fn is_error(&self) -> bool {
        self.failure.is_some()
    }
}
