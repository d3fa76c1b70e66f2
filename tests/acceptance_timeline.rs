//! Acceptance tests: load, build, search and jump through the public API.
//!
//! Each test drives a `ConversationView` the way a host application would:
//! records come from a source, navigation goes through a renderer.

use chatline::model::{ConversationId, EpochMillis, NavigationError, SequenceNumber};
use chatline::normalize::RawRecord;
use chatline::source::{InMemorySource, MessageSource, TimeRange};
use chatline::state::{ConversationView, JumpTarget, ViewSettings};
use chatline::timeline::{ItemIndex, TimelineItem};
use chatline::view::{ScrollAlign, VirtualListRenderer};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde_json::json;

const BASE_SECS: i64 = 1_709_812_800; // 2024-03-07T12:00:00Z

#[derive(Default)]
struct RecordingRenderer {
    calls: Vec<(ItemIndex, ScrollAlign)>,
}

impl VirtualListRenderer for RecordingRenderer {
    fn scroll_to_index(&mut self, index: ItemIndex, align: ScrollAlign) {
        self.calls.push((index, align));
    }
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("valid offset")
}

fn now() -> DateTime<FixedOffset> {
    utc()
        .with_ymd_and_hms(2024, 3, 7, 18, 0, 0)
        .single()
        .expect("valid datetime")
}

fn friend() -> ConversationId {
    ConversationId::new("friend").expect("valid id")
}

fn record(seq: i64, offset_secs: i64, text: &str) -> RawRecord {
    RawRecord::from_json_value(json!({
        "seq": seq,
        "time": BASE_SECS + offset_secs,
        "talker": "friend",
        "sender": "alice",
        "senderName": "Alice",
        "content": text,
    }))
}

fn load(records: &[RawRecord]) -> ConversationView {
    let source = InMemorySource::new(records.to_vec(), utc());
    let fetched = source.fetch(&friend(), None).expect("in-memory fetch");
    let mut view = ConversationView::new(ViewSettings::default());
    view.load(friend(), &fetched, None, now());
    view
}

fn separator_positions(view: &ConversationView) -> Vec<usize> {
    view.timeline()
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_separator())
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn separators_follow_the_five_minute_rule() {
    let view = load(&[
        record(1, 0, "one"),
        record(2, 100, "two"),
        record(3, 400, "three"),
    ]);

    // |1 2 |3
    assert_eq!(separator_positions(&view), vec![0, 3]);
    assert!(matches!(
        view.timeline().item(2),
        Some(TimelineItem::MessageRow {
            show_avatar: false,
            ..
        })
    ));
}

#[test]
fn gap_of_exactly_five_minutes_separates() {
    let view = load(&[record(1, 0, "one"), record(2, 300, "two")]);
    assert_eq!(separator_positions(&view), vec![0, 2]);
}

#[test]
fn gap_under_five_minutes_does_not_separate() {
    let view = load(&[record(1, 0, "one"), record(2, 299, "two")]);
    assert_eq!(separator_positions(&view), vec![0]);
}

#[test]
fn midnight_crossing_separates_and_indexes_both_days() {
    // 23:59 and 00:01 the next day, two minutes apart
    let view = load(&[record(1, 43_140, "late"), record(2, 43_260, "early")]);

    assert_eq!(separator_positions(&view), vec![0, 2]);
    let index = view.timeline().index();
    let mar7 = NaiveDate::from_ymd_opt(2024, 3, 7).expect("valid date");
    let mar8 = NaiveDate::from_ymd_opt(2024, 3, 8).expect("valid date");
    assert_eq!(index.item_for_day(mar7), Some(0));
    assert_eq!(index.item_for_day(mar8), Some(2));
}

#[test]
fn empty_conversation_yields_empty_timeline() {
    let view = load(&[]);
    assert!(view.timeline().is_empty());
    assert_eq!(view.timeline().index().sequence_count(), 0);
}

#[test]
fn malformed_timestamp_keeps_message_and_flags_it() {
    let mut bad = record(2, 0, "time is broken");
    bad.time = Some(json!("not a time"));
    let view = load(&[record(1, 0, "fine"), bad]);

    assert_eq!(view.messages().len(), 2);
    let broken = view
        .messages()
        .iter()
        .find(|m| m.sequence() == SequenceNumber::new(2))
        .expect("message kept");
    assert!(broken.has_fallback_time());
    assert_eq!(broken.time(), EpochMillis::UNIX_EPOCH);
}

#[test]
fn duplicate_sequence_numbers_are_flagged_last_wins() {
    let view = load(&[record(7, 0, "first"), record(7, 10, "second")]);

    assert_eq!(view.timeline().duplicate_sequences(), &[SequenceNumber::new(7)]);
    let item = view
        .timeline()
        .index()
        .item_for_sequence(SequenceNumber::new(7))
        .and_then(|i| view.timeline().item(i))
        .and_then(TimelineItem::as_message)
        .expect("indexed");
    assert_eq!(item.text(), "second");
}

#[test]
fn search_caps_at_one_hundred_in_chronological_order() {
    let records: Vec<RawRecord> = (0..150)
        .map(|i| record(i + 1, i * 10, &format!("Ping number {i}")))
        .collect();
    let mut view = load(&records);

    view.set_search_query("ping");
    let hits = view.search().hits();

    assert_eq!(hits.len(), 100);
    let seqs: Vec<i64> = hits.iter().map(|h| h.sequence().get()).collect();
    let expected: Vec<i64> = (1..=100).collect();
    assert_eq!(seqs, expected);
    assert!(view.search().is_panel_open());
}

#[test]
fn empty_query_yields_no_hits() {
    let mut view = load(&[record(1, 0, "anything")]);
    view.set_search_query("");
    assert!(view.search().hits().is_empty());
    assert!(!view.search().is_active());
}

#[test]
fn search_hit_jump_scrolls_to_message() {
    let mut view = load(&[
        record(1, 0, "hello"),
        record(2, 10, "the answer is 42"),
        record(3, 20, "bye"),
    ]);
    let mut renderer = RecordingRenderer::default();
    view.set_search_query("ANSWER");

    let target = JumpTarget::from(&view.search().hits()[0]);
    let item = view
        .jump(target, ScrollAlign::Center, &mut renderer)
        .expect("hit is in timeline");

    assert_eq!(item, 2);
    assert_eq!(renderer.calls, vec![(2, ScrollAlign::Center)]);
}

#[test]
fn absent_target_makes_zero_renderer_calls() {
    let mut view = load(&[record(1, 0, "only")]);
    let mut renderer = RecordingRenderer::default();

    let result = view.jump_to_sequence(SequenceNumber::new(500), &mut renderer);

    assert_eq!(
        result,
        Err(NavigationError::TargetUnavailable {
            target: JumpTarget::Sequence(SequenceNumber::new(500))
        })
    );
    assert!(renderer.calls.is_empty());
}

#[test]
fn switching_conversation_cancels_pending_settle() {
    let mut view = load(&[record(1, 0, "a"), record(2, 10, "b")]);
    let mut renderer = RecordingRenderer::default();
    view.display(0, None);

    view.load(friend(), &[record(9, 0, "new")], None, now());
    let events = view.poll(10_000, &mut renderer);

    assert_eq!(events.scrolled, None);
    assert!(renderer.calls.is_empty());
}

#[test]
fn time_bounded_fetch_limits_messages() {
    let source = InMemorySource::new(
        vec![record(1, 0, "a"), record(2, 600, "b"), record(3, 1_200, "c")],
        utc(),
    );
    let range = TimeRange::new(
        Some(EpochMillis::new((BASE_SECS + 300) * 1000)),
        Some(EpochMillis::new((BASE_SECS + 900) * 1000)),
    );
    let fetched = source.fetch(&friend(), Some(&range)).expect("fetch");

    assert_eq!(fetched.len(), 1);
}
