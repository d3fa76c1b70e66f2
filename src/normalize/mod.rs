//! Wire record normalization.
//!
//! Converts heterogeneous export records into canonical [`Message`]s.
//! Normalization is total: every record yields a message. Unusable fields are
//! replaced with defaults and recorded as [`MalformedInput`] on the message.

use crate::model::{
    AvatarUrls, ConversationId, EpochMillis, MalformedInput, Message, MessageKind, SequenceNumber,
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Values at or above this are read as milliseconds, below as seconds.
///
/// 1e11 seconds is year 5138; 1e11 milliseconds is March 1973.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Sender id used for outgoing messages that carry no sender.
pub const SELF_SENDER_ID: &str = "self";

/// Naive timestamp layouts accepted in addition to RFC 3339.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Raw export record. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawRecord {
    #[serde(default)]
    pub seq: Option<Value>,
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub talker: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default, rename = "senderName")]
    pub sender_name: Option<String>,
    #[serde(default, rename = "isSelf")]
    pub is_self: Option<Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<Value>,
    #[serde(default, rename = "subType")]
    pub sub_kind: Option<Value>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub contents: Option<Value>,
    #[serde(default, rename = "smallHeadURL")]
    pub small_head_url: Option<String>,
    #[serde(default, rename = "bigHeadURL")]
    pub big_head_url: Option<String>,
    /// Set when the record was not a JSON object at all.
    #[serde(skip)]
    pub not_an_object: bool,
}

impl RawRecord {
    /// Build a record from any JSON value without failing.
    ///
    /// Objects whose fields have unexpected types are salvaged field by field.
    pub fn from_json_value(value: Value) -> Self {
        let Value::Object(map) = &value else {
            return Self {
                not_an_object: true,
                ..Self::default()
            };
        };

        if let Ok(record) = serde_json::from_value::<RawRecord>(value.clone()) {
            return record;
        }

        let text = |key: &str| map.get(key).and_then(coerce_text);
        let raw = |key: &str| map.get(key).filter(|v| !v.is_null()).cloned();

        Self {
            seq: raw("seq"),
            time: raw("time"),
            talker: text("talker"),
            sender: text("sender"),
            sender_name: text("senderName"),
            is_self: raw("isSelf"),
            kind: raw("type"),
            sub_kind: raw("subType"),
            content: text("content"),
            contents: raw("contents"),
            small_head_url: text("smallHeadURL"),
            big_head_url: text("bigHeadURL"),
            not_an_object: false,
        }
    }
}

/// Explicit context for normalizing one conversation's records.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// Conversation every produced message belongs to.
    pub conversation: ConversationId,
    /// Offset used to interpret timestamps that carry no zone.
    pub offset: FixedOffset,
}

impl NormalizeContext {
    pub fn new(conversation: ConversationId, offset: FixedOffset) -> Self {
        Self {
            conversation,
            offset,
        }
    }
}

/// Normalize one record. Never fails.
pub fn normalize_record(record: &RawRecord, ctx: &NormalizeContext) -> Message {
    let mut issues = Vec::new();
    if record.not_an_object {
        issues.push(MalformedInput::NotAnObject);
    }

    let time = match record.time.as_ref().filter(|v| !v.is_null()) {
        None => {
            if !record.not_an_object {
                issues.push(MalformedInput::MissingTimestamp);
            }
            EpochMillis::UNIX_EPOCH
        }
        Some(value) => parse_timestamp(value, ctx.offset).unwrap_or_else(|| {
            issues.push(MalformedInput::Timestamp {
                raw: display_raw(value),
            });
            EpochMillis::UNIX_EPOCH
        }),
    };

    let sequence = match record.seq.as_ref().filter(|v| !v.is_null()) {
        None => {
            if !record.not_an_object {
                issues.push(MalformedInput::MissingSequence);
            }
            SequenceNumber::new(time.get())
        }
        Some(value) => match coerce_i64(value) {
            Some(seq) => SequenceNumber::new(seq),
            None => {
                issues.push(MalformedInput::Sequence {
                    raw: display_raw(value),
                });
                SequenceNumber::new(time.get())
            }
        },
    };

    let is_outgoing = record.is_self.as_ref().is_some_and(coerce_bool);
    let sender_id = match record.sender.as_deref().filter(|s| !s.is_empty()) {
        Some(sender) => sender.to_string(),
        None if is_outgoing => SELF_SENDER_ID.to_string(),
        None => String::new(),
    };
    let sender_name = record
        .sender_name
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| sender_id.clone());

    let kind = record
        .kind
        .as_ref()
        .map(parse_kind)
        .unwrap_or(MessageKind::Text);
    let rich_sub_kind = record.sub_kind.as_ref().and_then(coerce_i64).unwrap_or(0);

    for issue in &issues {
        warn!(
            conversation = %ctx.conversation,
            seq = %sequence,
            %issue,
            "Recovered malformed message record"
        );
    }

    let mut builder = Message::builder(ctx.conversation.clone(), sequence)
        .time(time)
        .sender(sender_id, sender_name)
        .outgoing(is_outgoing)
        .kind(kind, rich_sub_kind)
        .text(record.content.clone().unwrap_or_default())
        .payload(record.contents.clone().unwrap_or(Value::Null))
        .avatars(AvatarUrls {
            small: record.small_head_url.clone().filter(|s| !s.is_empty()),
            large: record.big_head_url.clone().filter(|s| !s.is_empty()),
        });
    for issue in issues {
        builder = builder.issue(issue);
    }
    builder.build()
}

/// Normalize a conversation's records and return them in timeline order.
pub fn normalize_batch(records: &[RawRecord], ctx: &NormalizeContext) -> Vec<Message> {
    let mut messages: Vec<Message> = records
        .iter()
        .map(|record| normalize_record(record, ctx))
        .collect();
    sort_chronologically(&mut messages);
    messages
}

/// Stable sort by time, then sequence number.
pub fn sort_chronologically<M: AsRef<Message>>(messages: &mut [M]) {
    messages.sort_by_key(|m| chronological_key(m.as_ref()));
}

/// Whether messages are already in (time, sequence) order.
pub fn is_chronological<M: AsRef<Message>>(messages: &[M]) -> bool {
    messages
        .windows(2)
        .all(|pair| chronological_key(pair[0].as_ref()) <= chronological_key(pair[1].as_ref()))
}

fn chronological_key(message: &Message) -> (EpochMillis, SequenceNumber) {
    (message.time(), message.sequence())
}

/// Parse a wire timestamp into epoch millis.
///
/// Accepts integer seconds or millis, numeric strings, RFC 3339 strings and
/// naive `YYYY-MM-DD HH:MM:SS` strings (read in `offset`). Instants outside
/// the calendar range have no day and count as unparseable.
pub fn parse_timestamp(value: &Value, offset: FixedOffset) -> Option<EpochMillis> {
    parse_timestamp_value(value, offset)
        .filter(|time| DateTime::from_timestamp_millis(time.get()).is_some())
}

fn parse_timestamp_value(value: &Value, offset: FixedOffset) -> Option<EpochMillis> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(epoch_from_integer(i))
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|secs| EpochMillis::new((secs * 1000.0) as i64))
            }
        }
        Value::String(s) => parse_timestamp_str(s.trim(), offset),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str, offset: FixedOffset) -> Option<EpochMillis> {
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(epoch_from_integer(i));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(EpochMillis::new(dt.timestamp_millis()));
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(s, fmt)
            .ok()
            .and_then(|naive| offset.from_local_datetime(&naive).single())
            .map(|dt| EpochMillis::new(dt.timestamp_millis()))
    })
}

fn epoch_from_integer(i: i64) -> EpochMillis {
    if i.abs() >= MILLIS_THRESHOLD {
        EpochMillis::new(i)
    } else {
        EpochMillis::new(i.saturating_mul(1000))
    }
}

fn parse_kind(value: &Value) -> MessageKind {
    if let Some(code) = coerce_i64(value) {
        return MessageKind::from_code(code);
    }
    match value {
        Value::String(name) => MessageKind::from_name(name.trim()).unwrap_or(MessageKind::Unknown(0)),
        _ => MessageKind::Unknown(0),
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|i| i != 0),
        Value::String(s) => matches!(s.trim(), "true" | "1"),
        _ => false,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        _ => None,
    }
}

fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
