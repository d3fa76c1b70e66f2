//! Timeline construction.
//!
//! Turns a conversation's messages into the flat item list consumed by a
//! virtualized list renderer: date separators interleaved with message rows,
//! plus the [`TimelineIndex`] used for navigation.
//!
//! The build is a pure O(n) pass and is redone wholesale whenever the message
//! set changes.

pub mod index;
pub mod label;

pub use index::{ItemIndex, TimelineIndex};
pub use label::{RelativeLabeler, SeparatorLabeler};

use crate::model::{EpochMillis, Message, SequenceNumber};
use crate::normalize::{is_chronological, sort_chronologically};
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, warn};

/// Gap at which a new separator and a fresh avatar run start.
pub const DEFAULT_GROUP_GAP_MS: u64 = 300_000;

// ===== TimelineItem =====

/// One renderable entry of the timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineItem {
    /// Time boundary marker placed before the first message after it.
    DateSeparator {
        /// Label for the following message's instant.
        label: String,
        /// Calendar day of the following message.
        day: NaiveDate,
    },
    /// A message, with run-grouping flags.
    MessageRow {
        message: Arc<Message>,
        show_avatar: bool,
        show_sender_name: bool,
    },
}

impl TimelineItem {
    pub fn as_message(&self) -> Option<&Arc<Message>> {
        match self {
            Self::MessageRow { message, .. } => Some(message),
            Self::DateSeparator { .. } => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::DateSeparator { .. })
    }
}

// ===== TimelineContext =====

/// Explicit inputs that affect grouping and labels.
#[derive(Debug, Clone, Copy)]
pub struct TimelineContext {
    /// Offset defining calendar days.
    pub offset: FixedOffset,
    /// Reference instant for relative labels.
    pub now: DateTime<FixedOffset>,
    /// Gap, in milliseconds, at or beyond which a new separator and avatar
    /// run start.
    pub group_gap_ms: u64,
}

impl TimelineContext {
    pub fn new(offset: FixedOffset, now: DateTime<FixedOffset>) -> Self {
        Self {
            offset,
            now,
            group_gap_ms: DEFAULT_GROUP_GAP_MS,
        }
    }

    pub fn with_group_gap_ms(mut self, group_gap_ms: u64) -> Self {
        self.group_gap_ms = group_gap_ms;
        self
    }

    /// Calendar day of an instant in this context's offset.
    pub fn day_of(&self, time: EpochMillis) -> NaiveDate {
        self.local(time).date_naive()
    }

    fn local(&self, time: EpochMillis) -> DateTime<FixedOffset> {
        time.to_datetime().with_timezone(&self.offset)
    }
}

// ===== Timeline =====

/// Built timeline: items plus navigation index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    items: Vec<TimelineItem>,
    index: TimelineIndex,
    duplicates: Vec<SequenceNumber>,
}

impl Timeline {
    pub fn items(&self) -> &[TimelineItem] {
        &self.items
    }

    pub fn item(&self, index: ItemIndex) -> Option<&TimelineItem> {
        self.items.get(index)
    }

    pub fn index(&self) -> &TimelineIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Empty timelines need an explicit empty state in the renderer.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last_index(&self) -> Option<ItemIndex> {
        self.items.len().checked_sub(1)
    }

    /// Sequence numbers that appeared more than once in the input.
    ///
    /// For these the index points at the last occurrence.
    pub fn duplicate_sequences(&self) -> &[SequenceNumber] {
        &self.duplicates
    }
}

/// Build the timeline for a message set.
///
/// Input is expected in (time, sequence) order; out-of-order input is sorted
/// before building.
pub fn build_timeline(
    messages: &[Arc<Message>],
    ctx: &TimelineContext,
    labeler: &dyn SeparatorLabeler,
) -> Timeline {
    let messages: Cow<'_, [Arc<Message>]> = if is_chronological(messages) {
        Cow::Borrowed(messages)
    } else {
        warn!(
            count = messages.len(),
            "Timeline input out of chronological order, sorting"
        );
        let mut sorted = messages.to_vec();
        sort_chronologically(&mut sorted);
        Cow::Owned(sorted)
    };

    let mut timeline = Timeline {
        items: Vec::with_capacity(messages.len() + messages.len() / 4 + 1),
        ..Timeline::default()
    };
    let mut previous: Option<(&Message, NaiveDate)> = None;

    for message in messages.iter() {
        let day = ctx.day_of(message.time());
        let gap_exceeded = previous
            .is_some_and(|(prev, _)| message.time().abs_diff(prev.time()) >= ctx.group_gap_ms);
        let day_changed = previous.is_some_and(|(_, prev_day)| prev_day != day);

        if previous.is_none() || gap_exceeded || day_changed {
            timeline.index.insert_day_if_absent(day, timeline.items.len());
            timeline.items.push(TimelineItem::DateSeparator {
                label: labeler.label(ctx.local(message.time()), ctx.now),
                day,
            });
        }
        let starts_run = previous
            .is_none_or(|(prev, _)| prev.sender_id() != message.sender_id() || gap_exceeded);

        let item_index = timeline.items.len();
        timeline.items.push(TimelineItem::MessageRow {
            message: Arc::clone(message),
            show_avatar: starts_run,
            show_sender_name: starts_run,
        });
        if timeline
            .index
            .insert_sequence(message.sequence(), item_index)
            .is_some()
        {
            warn!(seq = %message.sequence(), "Duplicate sequence number, keeping last occurrence");
            timeline.duplicates.push(message.sequence());
        }

        previous = Some((&**message, day));
    }

    debug!(
        messages = messages.len(),
        items = timeline.items.len(),
        days = timeline.index.days().count(),
        "Timeline rebuilt"
    );

    timeline
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod tests;
