// chat data model - what goes into the log and what comes back to the sender

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A stored chat message. Never changes once appended.
///
/// `id` is the only ordering key; `timestamp` comes from the wall clock and
/// may go backwards between two appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub user: String,
    #[serde(rename = "message")]
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of screening one message. Only the original sender sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Safe,
    Warning { text: String },
    #[serde(rename = "failed")]
    ClassificationFailed { reason: String },
}

impl Verdict {
    pub fn warning(text: impl Into<String>) -> Self {
        Self::Warning { text: text.into() }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::ClassificationFailed {
            reason: reason.into(),
        }
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe)
    }

    // raw collaborator text, in the shape older clients expect
    pub fn analysis(&self) -> Option<String> {
        match self {
            Self::Safe => Some("SAFE".to_string()),
            Self::Warning { text } => Some(text.clone()),
            Self::ClassificationFailed { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Warning { .. } => "WARNING",
            Self::ClassificationFailed { .. } => "FAILED",
        }
    }
}

/// Incoming submission as sent over the wire. Both fields are required but
/// either may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMessage {
    pub user: Option<String>,
    #[serde(rename = "message")]
    pub text: Option<String>,
}

impl NewMessage {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            text: Some(text.into()),
        }
    }

    // missing fields are a validation error, empty strings are fine
    pub fn validate(self) -> Result<(String, String), Error> {
        let user = self
            .user
            .ok_or_else(|| Error::Validation("missing field `user`".to_string()))?;
        let text = self
            .text
            .ok_or_else(|| Error::Validation("missing field `message`".to_string()))?;
        Ok((user, text))
    }
}

/// Result of a cursor read: everything after the cursor plus the new cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub messages: Vec<Message>,
    #[serde(rename = "lastMessageId")]
    pub cursor: u64,
}

/// What a sender gets back: the stored message and its verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub message: Message,
    pub verdict: Verdict,
}
