//! Core logic for chat digests.
//!
//! This crate turns exported chat-log text into the part a user has not
//! seen yet:
//! - Format detection and date extraction: bracketed or hyphen-delimited
//!   leading date tokens
//! - Day-order resolution: day-first versus month-first, chosen by counting
//!   chronological order violations
//! - Timeline reconstruction: jitter smoothing, longest non-decreasing run,
//!   forward fill
//! - Windowing: the suffix newer than a cutoff and the next cursor
//! - Chunking: splitting long replies under a message size ceiling
//!
//! Everything here is synchronous and stateless; persistence of cursors and
//! settings belongs to the caller.

pub mod chat;
pub mod chunk;
pub mod date;
pub mod format;
mod pipeline;
pub mod preset;
pub mod resolve;
pub mod timeline;
pub mod window;

pub use chat::chat_name_from_file;
pub use chunk::{DEFAULT_CEILING, DEFAULT_LOOKBACK, split_message};
pub use date::DayOrder;
pub use format::LineFormat;
pub use pipeline::{ReconstructConfig, Timeline, reconstruct_and_filter, reconstruct_timeline};
pub use preset::{TimeWindow, UnknownTimeWindow, describe_cutoff, next_cursor};
pub use resolve::{FormatError, ParseAttempt};
pub use window::{Cutoff, FilteredTranscript};
