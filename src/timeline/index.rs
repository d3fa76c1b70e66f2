//! Lookup indices from navigation keys to timeline item offsets.

use crate::model::SequenceNumber;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Item offset within a timeline's flat item list.
pub type ItemIndex = usize;

/// Maps produced alongside the timeline items.
///
/// `by_sequence` points at `MessageRow` items. `by_day` points at the first
/// separator of each calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineIndex {
    by_sequence: HashMap<SequenceNumber, ItemIndex>,
    by_day: BTreeMap<NaiveDate, ItemIndex>,
}

impl TimelineIndex {
    /// Item offset of the row for `sequence`, if loaded.
    pub fn item_for_sequence(&self, sequence: SequenceNumber) -> Option<ItemIndex> {
        self.by_sequence.get(&sequence).copied()
    }

    /// Item offset of the first separator of `day`, if any message falls on it.
    pub fn item_for_day(&self, day: NaiveDate) -> Option<ItemIndex> {
        self.by_day.get(&day).copied()
    }

    /// Calendar days present in the timeline, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_day.keys().copied()
    }

    pub fn sequence_count(&self) -> usize {
        self.by_sequence.len()
    }

    pub fn contains_sequence(&self, sequence: SequenceNumber) -> bool {
        self.by_sequence.contains_key(&sequence)
    }

    /// Record a row. Returns the previous offset when the sequence repeats.
    pub(crate) fn insert_sequence(
        &mut self,
        sequence: SequenceNumber,
        item: ItemIndex,
    ) -> Option<ItemIndex> {
        self.by_sequence.insert(sequence, item)
    }

    /// Record the first item of a day. Later calls for the same day are ignored.
    pub(crate) fn insert_day_if_absent(&mut self, day: NaiveDate, item: ItemIndex) -> bool {
        match self.by_day.entry(day) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(item);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
    }

    #[test]
    fn empty_index_resolves_nothing() {
        let index = TimelineIndex::default();
        assert_eq!(index.item_for_sequence(SequenceNumber::new(1)), None);
        assert_eq!(index.item_for_day(day(1)), None);
        assert_eq!(index.sequence_count(), 0);
    }

    #[test]
    fn repeated_sequence_keeps_last_and_reports_previous() {
        let mut index = TimelineIndex::default();
        assert_eq!(index.insert_sequence(SequenceNumber::new(1), 1), None);
        assert_eq!(index.insert_sequence(SequenceNumber::new(1), 4), Some(1));
        assert_eq!(index.item_for_sequence(SequenceNumber::new(1)), Some(4));
    }

    #[test]
    fn first_day_entry_wins() {
        let mut index = TimelineIndex::default();
        assert!(index.insert_day_if_absent(day(1), 0));
        assert!(!index.insert_day_if_absent(day(1), 7));
        assert_eq!(index.item_for_day(day(1)), Some(0));
    }

    #[test]
    fn days_iterate_ascending() {
        let mut index = TimelineIndex::default();
        index.insert_day_if_absent(day(5), 10);
        index.insert_day_if_absent(day(2), 0);
        let days: Vec<_> = index.days().collect();
        assert_eq!(days, vec![day(2), day(5)]);
    }
}
