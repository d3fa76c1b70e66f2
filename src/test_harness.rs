//! Shared fixtures for unit tests.
//!
//! Builds messages and contexts with fixed instants so tests never depend on
//! the wall clock.

use crate::model::{ConversationId, EpochMillis, Message, SequenceNumber};
use crate::timeline::TimelineContext;
use chrono::{DateTime, FixedOffset, TimeZone};
use std::sync::Arc;

/// 2024-03-07T12:00:00Z, a Thursday.
pub const BASE_MS: i64 = 1_709_812_800_000;

pub fn conversation() -> ConversationId {
    ConversationId::new("friend").expect("valid conversation id")
}

pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("valid offset")
}

/// Context with UTC days and `now` at 2024-03-07T18:00:00Z.
pub fn context() -> TimelineContext {
    TimelineContext::new(utc(), now())
}

pub fn now() -> DateTime<FixedOffset> {
    utc()
        .with_ymd_and_hms(2024, 3, 7, 18, 0, 0)
        .single()
        .expect("valid datetime")
}

/// Message with the given sequence, absolute time and sender.
pub fn message_at(seq: i64, time_ms: i64, sender: &str) -> Arc<Message> {
    Arc::new(
        Message::builder(conversation(), SequenceNumber::new(seq))
            .time(EpochMillis::new(time_ms))
            .sender(sender, sender.to_uppercase())
            .text(format!("message {seq}"))
            .build(),
    )
}

/// Message with text, `offset_secs` after [`BASE_MS`].
pub fn text_message(seq: i64, offset_secs: i64, sender: &str, text: &str) -> Arc<Message> {
    Arc::new(
        Message::builder(conversation(), SequenceNumber::new(seq))
            .time(EpochMillis::new(BASE_MS + offset_secs * 1000))
            .sender(sender, sender.to_uppercase())
            .text(text)
            .build(),
    )
}

/// Messages from one sender at the given second offsets from [`BASE_MS`].
/// Sequence numbers start at 1.
pub fn messages_at_offsets(offsets_secs: &[i64]) -> Vec<Arc<Message>> {
    offsets_secs
        .iter()
        .enumerate()
        .map(|(i, secs)| message_at(i as i64 + 1, BASE_MS + secs * 1000, "alice"))
        .collect()
}
