//! Day-first versus month-first resolution.
//!
//! Every candidate is parsed twice, once per [`DayOrder`]. The reading that
//! produces the more chronologically consistent sequence wins.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::date::{DayOrder, is_placeholder, parse_date};

/// The transcript cannot be anchored to a first instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The input held no lines at all.
    #[error("invalid format: transcript is empty")]
    EmptyTranscript,
    /// The first line's date is missing or unparseable under both orders.
    #[error("invalid format: first line has no usable date ({line:?})")]
    UnanchoredFirstLine { line: String },
}

/// One full parse of the transcript under a single day-order assumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAttempt {
    pub order: DayOrder,
    /// One entry per line; `None` where the candidate was absent, failed to
    /// parse, or parsed to a placeholder.
    pub instants: Vec<Option<NaiveDateTime>>,
    pub violations: usize,
}

impl ParseAttempt {
    /// Parses every candidate with `order` and counts order violations.
    pub fn run(candidates: &[Option<&str>], order: DayOrder) -> Self {
        let instants: Vec<_> = candidates
            .iter()
            .map(|candidate| {
                candidate
                    .and_then(|raw| parse_date(raw, order))
                    .filter(|instant| !is_placeholder(*instant))
            })
            .collect();
        let violations = count_violations(&instants);
        Self {
            order,
            instants,
            violations,
        }
    }

    /// The first line's instant, if this attempt could parse it.
    pub fn anchor(&self) -> Option<NaiveDateTime> {
        self.instants.first().copied().flatten()
    }
}

/// Counts lines whose instant is strictly earlier than the latest instant
/// seen before them. Missing instants are skipped.
pub fn count_violations(instants: &[Option<NaiveDateTime>]) -> usize {
    let mut latest: Option<NaiveDateTime> = None;
    let mut violations = 0;
    for instant in instants.iter().flatten() {
        match latest {
            Some(seen) if *instant < seen => violations += 1,
            _ => latest = Some(*instant),
        }
    }
    violations
}

/// Picks the day-order reading with fewer violations.
///
/// Only attempts that parse the first line compete. On an exact tie the
/// `tie_break` order wins.
pub fn resolve(
    candidates: &[Option<&str>],
    first_line: &str,
    tie_break: DayOrder,
) -> Result<ParseAttempt, FormatError> {
    let preferred = ParseAttempt::run(candidates, tie_break);
    let fallback = ParseAttempt::run(candidates, tie_break.other());

    tracing::debug!(
        preferred = %preferred.order,
        preferred_violations = preferred.violations,
        fallback = %fallback.order,
        fallback_violations = fallback.violations,
        "parsed transcript under both day orders"
    );

    match (preferred.anchor(), fallback.anchor()) {
        (Some(_), Some(_)) if fallback.violations < preferred.violations => Ok(fallback),
        (Some(_), _) => Ok(preferred),
        (None, Some(_)) => Ok(fallback),
        (None, None) => Err(FormatError::UnanchoredFirstLine {
            line: first_line.to_string(),
        }),
    }
}
