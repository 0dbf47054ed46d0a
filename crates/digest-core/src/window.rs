//! Selecting the lines newer than a cutoff.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Where the "new" part of a transcript starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum Cutoff {
    /// Lines at or after the instant are new. Used for fixed windows
    /// measured back from now.
    Since(NaiveDateTime),
    /// Lines strictly after the instant are new. Used for a stored cursor,
    /// whose instant has already been delivered.
    After(NaiveDateTime),
}

impl Cutoff {
    /// The boundary instant, regardless of inclusivity.
    pub const fn instant(self) -> NaiveDateTime {
        match self {
            Self::Since(instant) | Self::After(instant) => instant,
        }
    }

    /// Returns true when a line stamped `instant` falls inside the window.
    pub fn admits(self, instant: NaiveDateTime) -> bool {
        match self {
            Self::Since(cutoff) => instant >= cutoff,
            Self::After(cutoff) => instant > cutoff,
        }
    }
}

/// The new part of a transcript and the cursor to remember afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredTranscript {
    /// Original lines from the first admitted line onward, joined by `\n`.
    /// Empty when nothing is new.
    pub text: String,
    /// The latest reconstructed instant, or the cutoff itself when nothing
    /// is new.
    pub cursor: NaiveDateTime,
}

impl FilteredTranscript {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Returns the suffix of `lines` starting at the first admitted instant.
///
/// `timeline` must be non-decreasing and as long as `lines`.
pub fn filter_window(
    lines: &[&str],
    timeline: &[NaiveDateTime],
    cutoff: Cutoff,
) -> FilteredTranscript {
    debug_assert_eq!(lines.len(), timeline.len());

    let first_new = timeline.iter().position(|instant| cutoff.admits(*instant));
    match (first_new, timeline.last()) {
        (Some(start), Some(&latest)) => FilteredTranscript {
            text: lines[start..].join("\n"),
            cursor: latest,
        },
        _ => FilteredTranscript {
            text: String::new(),
            cursor: cutoff.instant(),
        },
    }
}
