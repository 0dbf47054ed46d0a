//! End-to-end reconstruction: raw transcript text to filtered suffix.

use chrono::{Duration, NaiveDateTime};

use crate::date::DayOrder;
use crate::format::{LineFormat, extract_candidates};
use crate::resolve::{FormatError, resolve};
use crate::timeline::{reconstruct, smooth};
use crate::window::{Cutoff, FilteredTranscript, filter_window};

/// Heuristic constants for timeline reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructConfig {
    /// Neighbouring instants closer than this are treated as the same instant.
    /// Default: 600 seconds.
    pub jitter: Duration,

    /// Day order chosen when both readings have the same violation count.
    /// Default: day-first.
    pub tie_break: DayOrder,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            jitter: Duration::seconds(600),
            tie_break: DayOrder::DayFirst,
        }
    }
}

/// A transcript with one reconstructed instant per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline<'a> {
    pub lines: Vec<&'a str>,
    /// Non-decreasing, same length as `lines`.
    pub instants: Vec<NaiveDateTime>,
    /// The day order that won resolution.
    pub order: DayOrder,
}

impl Timeline<'_> {
    /// Selects the lines inside `cutoff`.
    pub fn filter(&self, cutoff: Cutoff) -> FilteredTranscript {
        filter_window(&self.lines, &self.instants, cutoff)
    }
}

/// Reconstructs a best-effort, non-decreasing timeline for `raw`.
///
/// Leading and trailing whitespace of the whole text is ignored; interior
/// lines, including blank ones, are kept in order.
pub fn reconstruct_timeline<'a>(
    raw: &'a str,
    config: &ReconstructConfig,
) -> Result<Timeline<'a>, FormatError> {
    let lines: Vec<&str> = raw.trim().lines().collect();
    let Some(first) = lines.first().copied() else {
        return Err(FormatError::EmptyTranscript);
    };

    let format = LineFormat::detect(first);
    let candidates = extract_candidates(&lines, format);
    let attempt = resolve(&candidates, first, config.tie_break)?;
    let smoothed = smooth(&attempt.instants, config.jitter).ok_or_else(|| {
        FormatError::UnanchoredFirstLine {
            line: first.to_string(),
        }
    })?;
    let instants = reconstruct(&smoothed);

    tracing::debug!(
        ?format,
        order = %attempt.order,
        violations = attempt.violations,
        lines = lines.len(),
        "transcript timeline ready"
    );

    Ok(Timeline {
        lines,
        instants,
        order: attempt.order,
    })
}

/// Returns the lines of `raw` newer than `cutoff` and the proposed cursor.
///
/// Fails only when the first line cannot be dated under either day order.
pub fn reconstruct_and_filter(
    raw: &str,
    cutoff: Cutoff,
    config: &ReconstructConfig,
) -> Result<FilteredTranscript, FormatError> {
    Ok(reconstruct_timeline(raw, config)?.filter(cutoff))
}
