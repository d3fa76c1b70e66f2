//! Message sources.
//!
//! A source returns the full materialized record set for one conversation,
//! optionally bounded by time. There is no paging or cursor contract: every
//! fetch is a complete reload.
//!
//! - [`FileSource`] reads an archive export from disk once
//! - [`InMemorySource`] serves records held in memory

use crate::model::error::SourceError;
use crate::model::{ConversationId, EpochMillis, Message};
use crate::normalize::{parse_timestamp, RawRecord};
use chrono::FixedOffset;

pub mod file;

pub use file::FileSource;

/// Inclusive time bounds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<EpochMillis>,
    pub end: Option<EpochMillis>,
}

impl TimeRange {
    pub fn new(start: Option<EpochMillis>, end: Option<EpochMillis>) -> Self {
        Self { start, end }
    }

    /// Range with no bounds; contains every instant.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, time: EpochMillis) -> bool {
        self.start.is_none_or(|start| time >= start) && self.end.is_none_or(|end| time <= end)
    }

    /// Whether a message passes this filter.
    ///
    /// Messages with a substituted timestamp are kept: their real time is
    /// unknown, so dropping them would lose data silently.
    pub fn admits(&self, message: &Message) -> bool {
        message.has_fallback_time() || self.contains(message.time())
    }

    /// Whether a raw record passes this filter, using the same rule as
    /// [`TimeRange::admits`].
    pub fn admits_record(&self, record: &RawRecord, offset: FixedOffset) -> bool {
        match record.time.as_ref().and_then(|t| parse_timestamp(t, offset)) {
            Some(time) => self.contains(time),
            None => true,
        }
    }
}

/// Provider of raw records for a conversation.
pub trait MessageSource {
    /// Fetch every record of `conversation`, optionally within `range`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] only when the source as a whole is unusable.
    /// Individual malformed records are returned as-is for the normalizer.
    fn fetch(
        &self,
        conversation: &ConversationId,
        range: Option<&TimeRange>,
    ) -> Result<Vec<RawRecord>, SourceError>;
}

/// Shared filtering for sources that hold a mixed record list.
///
/// Records without a talker are attributed to the requested conversation.
pub(crate) fn select_records(
    records: &[RawRecord],
    conversation: &ConversationId,
    range: Option<&TimeRange>,
    offset: FixedOffset,
) -> Vec<RawRecord> {
    records
        .iter()
        .filter(|r| {
            r.talker
                .as_deref()
                .is_none_or(|talker| talker == conversation.as_str())
        })
        .filter(|r| range.is_none_or(|range| range.admits_record(r, offset)))
        .cloned()
        .collect()
}

/// Records held in memory, possibly spanning several conversations.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    records: Vec<RawRecord>,
    offset: FixedOffset,
}

impl InMemorySource {
    /// Source over `records`, interpreting zone-less timestamps in `offset`
    /// when filtering by range.
    pub fn new(records: Vec<RawRecord>, offset: FixedOffset) -> Self {
        Self { records, offset }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MessageSource for InMemorySource {
    fn fetch(
        &self,
        conversation: &ConversationId,
        range: Option<&TimeRange>,
    ) -> Result<Vec<RawRecord>, SourceError> {
        Ok(select_records(
            &self.records,
            conversation,
            range,
            self.offset,
        ))
    }
}
