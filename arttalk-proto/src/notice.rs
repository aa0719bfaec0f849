//! Relay-originated frames: the welcome `system` notice and `error` replies.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Text of the `system` notice sent when a connection opens.
pub const WELCOME_TEXT: &str = "Connected to Art Talks server";

/// Text of the `error` notice sent for an unparsable frame.
pub const INVALID_FORMAT_TEXT: &str = "Invalid message format";

/// The `type` tag of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Informational message from the relay.
    System,
    /// The recipient's own frame was rejected.
    Error,
}

/// Payload of a notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeData {
    /// Human-readable text.
    pub message: String,
}

/// A frame produced by the relay itself rather than forwarded from a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// `system` or `error`.
    #[serde(rename = "type")]
    pub kind: NoticeKind,
    /// Notice payload.
    pub data: NoticeData,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
}

impl Notice {
    /// Creates a notice stamped with the current time.
    #[must_use]
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            data: NoticeData {
                message: message.into(),
            },
            timestamp: timestamp_now(),
        }
    }

    /// The notice sent to a connection right after it opens.
    #[must_use]
    pub fn welcome() -> Self {
        Self::new(NoticeKind::System, WELCOME_TEXT)
    }

    /// The notice sent back for a frame that could not be parsed.
    #[must_use]
    pub fn invalid_format() -> Self {
        Self::new(NoticeKind::Error, INVALID_FORMAT_TEXT)
    }

    /// Serializes the notice to frame text.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] on serialization failure.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a notice from frame text.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the text is not a notice.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Current UTC time formatted like `2024-05-01T12:30:00.123Z`.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
