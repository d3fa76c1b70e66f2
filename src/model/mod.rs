//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod identifiers;
pub mod message;

// Re-export for convenience
pub use error::{AppError, MalformedInput, NavigationError, SourceError};
pub use identifiers::{ConversationId, EpochMillis, InvalidConversationId, SequenceNumber};
pub use message::{AvatarUrls, Message, MessageBuilder, MessageKind};
