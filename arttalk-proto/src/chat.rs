//! Inbound chat frames sent by discussion clients.
//!
//! A chat frame is a JSON object carrying at least a `type` tag. The relay
//! never rewrites a frame: [`ChatFrame`] keeps the original text next to the
//! few fields used for dispatch and logging.

use serde_json::{Map, Value};

/// Error type for chat frame decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The frame is valid JSON but not an object.
    #[error("frame must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    /// The frame exceeds the configured size limit.
    #[error("frame too large: {size} bytes (max {max})")]
    TooLarge {
        /// Size of the rejected frame in bytes.
        size: usize,
        /// Configured maximum in bytes.
        max: usize,
    },
    /// A binary frame did not contain valid UTF-8.
    #[error("frame is not valid UTF-8")]
    NotUtf8,
}

/// The `type` tag of a chat frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// A chat message; `data.text` carries the content.
    Message,
    /// The sender started typing.
    Typing,
    /// The sender stopped typing.
    StopTyping,
    /// Any other tag, including a missing or non-string `type`.
    ///
    /// Frames of these kinds are accepted but not relayed.
    Other(Option<String>),
}

impl FrameKind {
    /// Parses a `type` tag.
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("message") => Self::Message,
            Some("typing") => Self::Typing,
            Some("stop_typing") => Self::StopTyping,
            other => Self::Other(other.map(str::to_string)),
        }
    }

    /// Returns the wire tag, or `None` for a frame without a string `type`.
    #[must_use]
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            Self::Message => Some("message"),
            Self::Typing => Some("typing"),
            Self::StopTyping => Some("stop_typing"),
            Self::Other(tag) => tag.as_deref(),
        }
    }

    /// Whether frames of this kind are fanned out to the sender's room.
    #[must_use]
    pub const fn is_relayed(&self) -> bool {
        matches!(self, Self::Message | Self::Typing | Self::StopTyping)
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatFrame {
    /// Dispatch tag.
    pub kind: FrameKind,
    /// Client-stamped sender label, if present and a string.
    pub sender: Option<String>,
    /// All fields of the frame as received.
    pub fields: Map<String, Value>,
    raw: String,
}

impl ChatFrame {
    /// The frame exactly as the client sent it.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Consumes the frame, returning the original text.
    #[must_use]
    pub fn into_raw(self) -> String {
        self.raw
    }

    /// The opaque `data` payload, if present.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.fields.get("data")
    }
}

/// Decodes a chat frame from text.
///
/// # Errors
///
/// Returns [`FrameError::InvalidJson`] if the text does not parse, or
/// [`FrameError::NotAnObject`] if it parses to anything but an object.
pub fn decode(text: &str) -> Result<ChatFrame, FrameError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(fields) = value else {
        return Err(FrameError::NotAnObject(json_kind(&value)));
    };

    let kind = FrameKind::from_tag(fields.get("type").and_then(Value::as_str));
    let sender = fields
        .get("sender")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ChatFrame {
        kind,
        sender,
        fields,
        raw: text.to_string(),
    })
}

/// Decodes a chat frame, rejecting text longer than `max` bytes first.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] before attempting to parse, otherwise
/// the errors of [`decode`].
pub fn decode_bounded(text: &str, max: usize) -> Result<ChatFrame, FrameError> {
    if text.len() > max {
        return Err(FrameError::TooLarge {
            size: text.len(),
            max,
        });
    }
    decode(text)
}

/// Interprets a binary WebSocket payload as frame text.
///
/// # Errors
///
/// Returns [`FrameError::NotUtf8`] if the bytes are not valid UTF-8.
pub fn text_from_binary(bytes: &[u8]) -> Result<&str, FrameError> {
    std::str::from_utf8(bytes).map_err(|_| FrameError::NotUtf8)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
