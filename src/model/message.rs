//! Canonical message entity produced by the normalizer.
//!
//! Messages are immutable once built. Fields are private; construct with
//! [`Message::builder`] so every message carries a conversation and identity.

use crate::model::error::MalformedInput;
use crate::model::{ConversationId, EpochMillis, SequenceNumber};

// ===== MessageKind =====

/// Closed set of message kinds seen in archive exports.
///
/// Renderers match on this exhaustively; unknown provider codes are kept in
/// `Unknown` rather than dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Plain text
    Text,
    Image,
    Voice,
    /// Shared contact card
    ContactCard,
    Video,
    /// Sticker / custom emoji
    Sticker,
    Location,
    /// App message: links, files, quotes, transfers. See `rich_sub_kind`.
    Rich,
    /// Voice or video call record
    Call,
    /// System notice (recall, join, pat, ...)
    System,
    /// Sentinel: history between neighbours has not been loaded.
    Gap,
    /// Sentinel: a requested range holds no messages.
    EmptyRange,
    /// Provider code this viewer does not know.
    Unknown(i64),
}

impl MessageKind {
    /// Map a numeric provider type code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Text,
            3 => Self::Image,
            34 => Self::Voice,
            42 => Self::ContactCard,
            43 => Self::Video,
            47 => Self::Sticker,
            48 => Self::Location,
            49 => Self::Rich,
            50 => Self::Call,
            10000 => Self::System,
            other => Self::Unknown(other),
        }
    }

    /// Map a sentinel kind name. Returns `None` for unrecognized names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Gap" => Some(Self::Gap),
            "EmptyRange" => Some(Self::EmptyRange),
            _ => None,
        }
    }

    /// Whether this is a paging sentinel rather than real content.
    ///
    /// Sentinels are carried through untouched; this core always loads full
    /// history and never acts on them.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Gap | Self::EmptyRange)
    }
}

// ===== AvatarUrls =====

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvatarUrls {
    pub small: Option<String>,
    pub large: Option<String>,
}

impl AvatarUrls {
    /// Preferred URL for a row avatar: small first, then large.
    pub fn preferred(&self) -> Option<&str> {
        self.small.as_deref().or(self.large.as_deref())
    }
}

// ===== Message =====

/// A normalized chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    sequence: SequenceNumber,
    conversation: ConversationId,
    time: EpochMillis,
    sender_id: String,
    sender_name: String,
    is_outgoing: bool,
    kind: MessageKind,
    rich_sub_kind: i64,
    text: String,
    payload: serde_json::Value,
    avatars: AvatarUrls,
    issues: Vec<MalformedInput>,
}

impl Message {
    /// Start building a message with its two identity fields.
    pub fn builder(conversation: ConversationId, sequence: SequenceNumber) -> MessageBuilder {
        MessageBuilder {
            message: Message {
                sequence,
                conversation,
                time: EpochMillis::UNIX_EPOCH,
                sender_id: String::new(),
                sender_name: String::new(),
                is_outgoing: false,
                kind: MessageKind::Text,
                rich_sub_kind: 0,
                text: String::new(),
                payload: serde_json::Value::Null,
                avatars: AvatarUrls::default(),
                issues: Vec::new(),
            },
        }
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    pub fn time(&self) -> EpochMillis {
        self.time
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    pub fn is_outgoing(&self) -> bool {
        self.is_outgoing
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Provider sub-type for [`MessageKind::Rich`] messages, 0 otherwise.
    pub fn rich_sub_kind(&self) -> i64 {
        self.rich_sub_kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Kind-specific payload, passed through untouched for renderers.
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn avatars(&self) -> &AvatarUrls {
        &self.avatars
    }

    /// Recoverable problems found while normalizing this message.
    pub fn issues(&self) -> &[MalformedInput] {
        &self.issues
    }

    /// Whether the time was substituted because the record's was unusable.
    pub fn has_fallback_time(&self) -> bool {
        self.issues.iter().any(MalformedInput::affects_time)
    }
}

impl AsRef<Message> for Message {
    fn as_ref(&self) -> &Message {
        self
    }
}

/// Builder for [`Message`]. Unset fields keep their defaults.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn time(mut self, time: EpochMillis) -> Self {
        self.message.time = time;
        self
    }

    pub fn sender(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.message.sender_id = id.into();
        self.message.sender_name = name.into();
        self
    }

    pub fn outgoing(mut self, is_outgoing: bool) -> Self {
        self.message.is_outgoing = is_outgoing;
        self
    }

    pub fn kind(mut self, kind: MessageKind, rich_sub_kind: i64) -> Self {
        self.message.kind = kind;
        self.message.rich_sub_kind = rich_sub_kind;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.message.text = text.into();
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.message.payload = payload;
        self
    }

    pub fn avatars(mut self, avatars: AvatarUrls) -> Self {
        self.message.avatars = avatars;
        self
    }

    pub fn issue(mut self, issue: MalformedInput) -> Self {
        self.message.issues.push(issue);
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}
