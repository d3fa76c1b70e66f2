//! Error types for chatline.
//!
//! The hierarchy uses `thiserror` and composes through `From` and `?`.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error for the binary shell
//!   - [`SourceError`] - The message source could not produce records
//!   - [`ConfigError`](crate::config::ConfigError) - Config file unreadable or invalid
//!   - [`LoggingError`](crate::logging::LoggingError) - Subscriber setup failed
//! - [`MalformedInput`] - Per-record recoverable problem, stored on the message
//! - [`NavigationError`] - A jump target is absent from the current index
//!
//! # Recovery Strategy
//!
//! Record-level problems are never returned as `Err`: the normalizer substitutes
//! a safe default and records a [`MalformedInput`] on the message. Navigation
//! failures are returned to the caller, which may treat them as a no-op or show
//! a disabled affordance. Only source, config and logging failures are fatal,
//! and only for the binary.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::state::jump::JumpTarget;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to load records from the message source.
    #[error("Failed to load messages: {0}")]
    Source(#[from] SourceError),

    /// Failed to load configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failed to initialize logging.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// The requested conversation id is unusable.
    #[error("Invalid conversation: {0}")]
    Conversation(#[from] crate::model::InvalidConversationId),

    /// Output or other I/O failure in the shell.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a message source when it cannot produce records at all.
///
/// Individual bad records are not source errors; they are normalized with
/// fallbacks.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The export file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
    },

    /// The export file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is neither a JSON array nor a JSONL stream.
    #[error("Invalid export document {path}: {reason}")]
    InvalidDocument {
        /// Path of the document.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

/// A recoverable problem with one wire record.
///
/// The message is still produced; this records which default was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedInput {
    /// The time field was present but could not be parsed.
    #[error("unparseable timestamp {raw:?}, using epoch")]
    Timestamp {
        /// Raw value as it appeared on the wire.
        raw: String,
    },

    /// The record had no time field.
    #[error("missing timestamp, using epoch")]
    MissingTimestamp,

    /// The sequence field was present but not an integer.
    #[error("unparseable sequence {raw:?}, derived from timestamp")]
    Sequence {
        /// Raw value as it appeared on the wire.
        raw: String,
    },

    /// The record had no sequence field.
    #[error("missing sequence, derived from timestamp")]
    MissingSequence,

    /// The record was not a JSON object; every field was defaulted.
    #[error("record is not an object")]
    NotAnObject,
}

impl MalformedInput {
    /// Whether the message's time is a substitute.
    pub fn affects_time(&self) -> bool {
        matches!(
            self,
            Self::Timestamp { .. } | Self::MissingTimestamp | Self::NotAnObject
        )
    }
}

/// Navigation failures reported by the jump coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The target is not present in the current timeline index.
    #[error("navigation unavailable: {target:?} is not in the loaded timeline")]
    TargetUnavailable {
        /// The target that could not be resolved.
        target: JumpTarget,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SequenceNumber;

    #[test]
    fn file_not_found_mentions_path() {
        let err = SourceError::FileNotFound {
            path: PathBuf::from("/tmp/missing.json"),
        };
        assert!(err.to_string().contains("/tmp/missing.json"));
    }

    #[test]
    fn source_error_converts_to_app_error() {
        fn load() -> Result<(), AppError> {
            Err(SourceError::FileNotFound {
                path: PathBuf::from("x.json"),
            })?;
            Ok(())
        }
        assert!(matches!(load(), Err(AppError::Source(_))));
    }

    #[test]
    fn time_issues_are_classified() {
        assert!(MalformedInput::MissingTimestamp.affects_time());
        assert!(MalformedInput::Timestamp { raw: "x".into() }.affects_time());
        assert!(MalformedInput::NotAnObject.affects_time());
        assert!(!MalformedInput::MissingSequence.affects_time());
        assert!(!MalformedInput::Sequence { raw: "x".into() }.affects_time());
    }

    #[test]
    fn navigation_error_names_target() {
        let err = NavigationError::TargetUnavailable {
            target: JumpTarget::Sequence(SequenceNumber::new(99)),
        };
        let text = err.to_string();
        assert!(text.contains("navigation unavailable"));
        assert!(text.contains("99"));
    }
}
