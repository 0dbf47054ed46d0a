//! Time-window presets and cursor arithmetic.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::window::Cutoff;

/// How far back `auto` looks when no newer cursor is stored.
const AUTO_LOOKBACK: Span = Span::Months(3);

/// Cutoffs at least this far back are shown as "forever".
const FOREVER: Span = Span::Months(45 * 12);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Days(u64),
    Months(u32),
}

impl Span {
    fn before(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Days(n) => now.checked_sub_days(Days::new(n)),
            Self::Months(n) => now.checked_sub_months(Months::new(n)),
        }
        .unwrap_or(NaiveDateTime::MIN)
    }
}

/// The user-selectable summary window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeWindow {
    Day,
    ThreeDays,
    Week,
    TwoWeeks,
    Month,
    TwoMonths,
    ThreeMonths,
    SixMonths,
    Year,
    TwoYears,
    AllTime,
    /// Everything since the stored cursor, bounded to three months.
    #[default]
    Auto,
}

impl TimeWindow {
    /// All presets in menu order.
    pub const ALL: [Self; 12] = [
        Self::Day,
        Self::ThreeDays,
        Self::Week,
        Self::TwoWeeks,
        Self::Month,
        Self::TwoMonths,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::Year,
        Self::TwoYears,
        Self::AllTime,
        Self::Auto,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Day => "1 day",
            Self::ThreeDays => "3 days",
            Self::Week => "1 week",
            Self::TwoWeeks => "2 weeks",
            Self::Month => "1 month",
            Self::TwoMonths => "2 months",
            Self::ThreeMonths => "3 months",
            Self::SixMonths => "6 months",
            Self::Year => "1 year",
            Self::TwoYears => "2 years",
            Self::AllTime => "all time",
            Self::Auto => "auto",
        }
    }

    const fn span(self) -> Option<Span> {
        match self {
            Self::Day => Some(Span::Days(1)),
            Self::ThreeDays => Some(Span::Days(3)),
            Self::Week => Some(Span::Days(7)),
            Self::TwoWeeks => Some(Span::Days(14)),
            Self::Month => Some(Span::Months(1)),
            Self::TwoMonths => Some(Span::Months(2)),
            Self::ThreeMonths => Some(Span::Months(3)),
            Self::SixMonths => Some(Span::Months(6)),
            Self::Year => Some(Span::Months(12)),
            Self::TwoYears => Some(Span::Months(24)),
            Self::AllTime => Some(Span::Months(50 * 12)),
            Self::Auto => None,
        }
    }

    /// Derives the cutoff for this window at `now`.
    ///
    /// Fixed windows count back from `now` and are inclusive. `Auto` resumes
    /// strictly after the stored cursor, unless the cursor is missing or
    /// older than three months, in which case it falls back to three months.
    pub fn cutoff(self, now: NaiveDateTime, cursor: Option<NaiveDateTime>) -> Cutoff {
        if let Some(span) = self.span() {
            return Cutoff::Since(span.before(now));
        }
        let bound = AUTO_LOOKBACK.before(now);
        match cursor {
            Some(cursor) if cursor >= bound => Cutoff::After(cursor),
            _ => Cutoff::Since(bound),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TimeWindow {
    type Err = UnknownTimeWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|window| window.label() == normalized)
            .ok_or_else(|| UnknownTimeWindow(s.to_string()))
    }
}

impl Serialize for TimeWindow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for TimeWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown time-window labels.
#[derive(Debug, Clone)]
pub struct UnknownTimeWindow(String);

impl fmt::Display for UnknownTimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown time window: {}", self.0)
    }
}

impl std::error::Error for UnknownTimeWindow {}

/// The cursor value to persist after a successful run.
///
/// Transcripts can carry future-dated lines; the stored cursor never runs
/// ahead of the clock.
pub fn next_cursor(now: NaiveDateTime, proposed: NaiveDateTime) -> NaiveDateTime {
    proposed.min(now)
}

/// Renders a cutoff for a summary header.
pub fn describe_cutoff(now: NaiveDateTime, cutoff: NaiveDateTime) -> String {
    if cutoff <= FOREVER.before(now) {
        "forever".to_string()
    } else {
        cutoff.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
