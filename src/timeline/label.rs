//! Separator label formatting.
//!
//! The timeline builder only decides where separators go. The text comes
//! from a [`SeparatorLabeler`], so hosts can localize it.

use chrono::{DateTime, Datelike, Duration, FixedOffset};

/// Produces the label for a separator placed before a message at `instant`.
pub trait SeparatorLabeler {
    fn label(&self, instant: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> String;
}

/// Relative labels in the style of chat apps.
///
/// - today: `14:05`
/// - yesterday: `Yesterday 14:05`
/// - earlier this week: `Tuesday 14:05`
/// - earlier this year: `03-01 14:05`
/// - otherwise: `2023-03-01 14:05`
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeLabeler;

impl SeparatorLabeler for RelativeLabeler {
    fn label(&self, instant: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> String {
        let day = instant.date_naive();
        let today = now.date_naive();
        let time = instant.format("%H:%M");

        if day == today {
            return time.to_string();
        }
        if Some(day) == today.pred_opt() {
            return format!("Yesterday {time}");
        }
        if day < today
            && today.signed_duration_since(day) < Duration::days(7)
            && day.iso_week() == today.iso_week()
        {
            return instant.format("%A %H:%M").to_string();
        }
        if day.year() == today.year() {
            return instant.format("%m-%d %H:%M").to_string();
        }
        instant.format("%Y-%m-%d %H:%M").to_string()
    }
}
