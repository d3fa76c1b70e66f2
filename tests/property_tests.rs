//! Property-based tests for timeline, search and replay invariants.
//!
//! Tests validate:
//! 1. Timeline shape: item counts, index targets, idempotence
//! 2. Search: cap, order, case-insensitive containment, empty query
//! 3. Replay: revealed bounds and delay clamping

use chatline::model::{ConversationId, EpochMillis, Message, SequenceNumber};
use chatline::state::replay::{ReplayConfig, ReplayPhase, ReplayScheduler};
use chatline::state::search::{search_messages, SearchConfig};
use chatline::timeline::{build_timeline, RelativeLabeler, TimelineContext, TimelineItem};
use chrono::{FixedOffset, TimeZone};
use proptest::prelude::*;
use std::sync::Arc;

const BASE_MS: i64 = 1_709_812_800_000;

fn context() -> TimelineContext {
    let utc = FixedOffset::east_opt(0).expect("valid offset");
    let now = utc
        .with_ymd_and_hms(2024, 3, 7, 18, 0, 0)
        .single()
        .expect("valid datetime");
    TimelineContext::new(utc, now)
}

/// Messages from `(gap_secs, sender, text)` steps, ascending in time.
fn conversation(steps: &[(u32, u8, String)]) -> Vec<Arc<Message>> {
    let id = ConversationId::new("friend").expect("valid id");
    let mut time = BASE_MS;
    steps
        .iter()
        .enumerate()
        .map(|(i, (gap, sender, text))| {
            time += i64::from(*gap) * 1000;
            let sender = format!("user{sender}");
            Arc::new(
                Message::builder(id.clone(), SequenceNumber::new(i as i64 + 1))
                    .time(EpochMillis::new(time))
                    .sender(sender.clone(), sender)
                    .text(text.clone())
                    .build(),
            )
        })
        .collect()
}

fn steps() -> impl Strategy<Value = Vec<(u32, u8, String)>> {
    prop::collection::vec((0u32..1_000, 0u8..3, "[a-c ]{0,12}"), 0..60)
}

// ===== Property 1: Timeline Shape =====

proptest! {
    #[test]
    fn item_count_is_at_least_message_count(steps in steps()) {
        let messages = conversation(&steps);
        let timeline = build_timeline(&messages, &context(), &RelativeLabeler);

        let rows = timeline.items().iter().filter(|i| !i.is_separator()).count();
        prop_assert_eq!(rows, messages.len());
        prop_assert!(timeline.len() >= messages.len());
        prop_assert_eq!(timeline.is_empty(), messages.is_empty());
    }

    #[test]
    fn non_empty_timeline_starts_with_separator(steps in steps()) {
        let messages = conversation(&steps);
        let timeline = build_timeline(&messages, &context(), &RelativeLabeler);

        if let Some(first) = timeline.items().first() {
            prop_assert!(first.is_separator());
        }
    }

    #[test]
    fn sequence_index_points_at_matching_row(steps in steps()) {
        let messages = conversation(&steps);
        let timeline = build_timeline(&messages, &context(), &RelativeLabeler);

        for message in &messages {
            let item = timeline.index().item_for_sequence(message.sequence());
            let row = item.and_then(|i| timeline.item(i)).and_then(TimelineItem::as_message);
            prop_assert_eq!(row.map(|m| m.sequence()), Some(message.sequence()));
        }
    }

    #[test]
    fn day_index_points_at_separator(steps in steps()) {
        let messages = conversation(&steps);
        let timeline = build_timeline(&messages, &context(), &RelativeLabeler);

        for day in timeline.index().days() {
            let index = timeline.index().item_for_day(day);
            let item = index.and_then(|i| timeline.item(i));
            let is_day_separator =
                matches!(item, Some(TimelineItem::DateSeparator { day: d, .. }) if *d == day);
            prop_assert!(is_day_separator, "day {} maps to {:?}, not its separator", day, index);
        }
    }

    #[test]
    fn build_is_idempotent(steps in steps()) {
        let messages = conversation(&steps);
        let first = build_timeline(&messages, &context(), &RelativeLabeler);
        let second = build_timeline(&messages, &context(), &RelativeLabeler);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn shuffled_input_builds_same_timeline(steps in steps()) {
        let messages = conversation(&steps);
        let mut reversed = messages.clone();
        reversed.reverse();

        let sorted = build_timeline(&messages, &context(), &RelativeLabeler);
        let resorted = build_timeline(&reversed, &context(), &RelativeLabeler);
        prop_assert_eq!(sorted, resorted);
    }
}

// ===== Property 2: Search =====

proptest! {
    #[test]
    fn search_hits_are_capped_ordered_and_matching(
        steps in steps(),
        query in "[a-cA-C]{1,2}",
        limit in 1usize..20,
    ) {
        let messages = conversation(&steps);
        let config = SearchConfig { hit_limit: limit, ..SearchConfig::default() };
        let hits = search_messages(&messages, &query, &config);

        prop_assert!(hits.len() <= limit);
        let needle = query.to_lowercase();
        for hit in &hits {
            prop_assert!(hit.message().text().to_lowercase().contains(&needle));
        }
        for pair in hits.windows(2) {
            prop_assert!(pair[0].message().time() <= pair[1].message().time());
            prop_assert!(pair[0].sequence() < pair[1].sequence());
        }

        let expected = messages
            .iter()
            .filter(|m| m.text().to_lowercase().contains(&needle))
            .count()
            .min(limit);
        prop_assert_eq!(hits.len(), expected);
    }

    #[test]
    fn blank_query_matches_nothing(steps in steps(), blank in "[ \t]{0,4}") {
        let messages = conversation(&steps);
        prop_assert!(search_messages(&messages, &blank, &SearchConfig::default()).is_empty());
    }
}

// ===== Property 3: Replay =====

proptest! {
    #[test]
    fn delays_stay_within_bounds(steps in steps(), speed in 0.1f64..50.0) {
        let messages = conversation(&steps);
        let config = ReplayConfig::default();
        let mut replay = ReplayScheduler::new(messages.clone(), config);
        replay.set_speed(speed).expect("positive speed");

        for index in 1..messages.len() {
            let delay = replay.delay_before(index);
            prop_assert!(delay >= config.min_delay_ms && delay <= config.max_delay_ms);
        }
    }

    #[test]
    fn polling_never_overshoots_total(steps in steps(), polls in prop::collection::vec(0u64..5_000, 0..20)) {
        let messages = conversation(&steps);
        let mut replay = ReplayScheduler::new(messages, ReplayConfig::default());
        replay.play(0);

        let mut now = 0;
        for step in polls {
            now += step;
            replay.poll(now);
            prop_assert!(replay.revealed_count() <= replay.total());
            if replay.revealed_count() == replay.total() {
                prop_assert!(!replay.is_playing());
                prop_assert_eq!(replay.phase(), ReplayPhase::Finished);
            }
        }
    }
}
