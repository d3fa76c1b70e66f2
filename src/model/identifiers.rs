//! Core identifier newtypes with smart constructors.
//!
//! String identifiers validate non-empty input at construction time.

use std::fmt;

/// Stable talker id of a single chat thread (person or group).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

impl ConversationId {
    /// Smart constructor: validates non-empty, non-whitespace id.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidConversationId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            Err(InvalidConversationId::Empty)
        } else {
            Ok(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-conversation message identity assigned by the message source.
///
/// Ordering follows the raw value; it is the tie-breaker for messages that
/// share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceNumber(i64);

impl SequenceNumber {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EpochMillis(i64);

impl EpochMillis {
    /// Fallback instant used when a record carries no usable time.
    pub const UNIX_EPOCH: Self = Self(0);

    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// Absolute distance to another instant, in milliseconds.
    pub fn abs_diff(&self, other: EpochMillis) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Convert to a chrono instant. Out-of-range values map to the epoch.
    pub fn to_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.0).unwrap_or_default()
    }
}

// ===== Error Types =====

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConversationId {
    #[error("Conversation ID cannot be empty")]
    Empty,
}

// ===== Tests =====
