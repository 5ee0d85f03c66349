//! Date-range presets for filtering the ledger.

use serde::Deserialize;
use time::{Date, Duration, Month};

use crate::transaction::DateRange;

/// A named date range anchored to the current date.
///
/// Presets resolve against an explicit `today` so that the same filter
/// produces the same range regardless of where or when it is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodPreset {
    /// The current date only.
    Today,
    /// The calendar week containing `today`, Monday through Sunday.
    Week,
    /// The calendar month containing `today`.
    Month,
}

impl PeriodPreset {
    /// Resolve the preset into a concrete date range containing `today`.
    pub fn date_range(self, today: Date) -> DateRange {
        match self {
            PeriodPreset::Today => DateRange {
                from: today,
                to: None,
            },
            PeriodPreset::Week => week_bounds(today),
            PeriodPreset::Month => month_bounds(today.year(), today.month()),
        }
    }
}

fn week_bounds(anchor_date: Date) -> DateRange {
    let weekday_number = anchor_date.weekday().number_from_monday() as i64;
    let start = anchor_date - Duration::days(weekday_number - 1);
    let end = start + Duration::days(6);

    DateRange {
        from: start,
        to: Some(end),
    }
}

pub(crate) fn month_bounds(year: i32, month: Month) -> DateRange {
    let start = Date::from_calendar_date(year, month, 1).expect("invalid month start date");
    let end =
        Date::from_calendar_date(year, month, month.length(year)).expect("invalid month end date");

    DateRange {
        from: start,
        to: Some(end),
    }
}
