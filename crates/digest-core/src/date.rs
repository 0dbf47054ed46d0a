//! Best-effort parsing of the date tokens found at the start of chat lines.
//!
//! Exported transcripts use whatever date layout the exporting device was
//! configured with, so the parser is deliberately lenient: it accepts
//! numeric dates with any of the usual separators, English month names,
//! weekday names, and an optional clock with AM/PM. The only thing it cannot
//! decide on its own is whether `01/02` means the first of February or the
//! second of January; that choice is passed in as a [`DayOrder`] and settled
//! later by comparing both readings of the whole file.
//!
//! Fields missing from a candidate fall back to the minimal calendar date
//! (year 1, January, day 1). A result that still lands in year 1 carries no
//! real calendar information and is reported by [`is_placeholder`].

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Clock component: `H:MM`, `H:MM:SS`, optional fraction, optional AM/PM.
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]{1,2}):([0-9]{2})(?::([0-9]{2})(?:[.,][0-9]+)?)?(?:\s*([ap])\.?\s?m\b\.?)?")
        .unwrap()
});

/// Everything left after the clock is removed: digit runs and words.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+|\p{Alphabetic}+").unwrap());

/// Year assumed when a candidate carries no year at all.
pub const PLACEHOLDER_YEAR: i32 = 1;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Words that may appear around a date without changing its meaning.
const FILLER_WORDS: [&str; 11] = [
    "at", "on", "of", "the", "t", "z", "utc", "gmt", "st", "nd", "rd",
];

/// Which of the two leading numeric fields holds the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOrder {
    /// `01/02/2023` is the first of February.
    DayFirst,
    /// `01/02/2023` is the second of January.
    MonthFirst,
}

impl DayOrder {
    /// Both orders, day-first first.
    pub const BOTH: [Self; 2] = [Self::DayFirst, Self::MonthFirst];

    /// Returns the opposite assumption.
    pub const fn other(self) -> Self {
        match self {
            Self::DayFirst => Self::MonthFirst,
            Self::MonthFirst => Self::DayFirst,
        }
    }

    /// Maps two leading fields to `(month, day)`.
    ///
    /// A month above 12 is impossible, so the fields are swapped when that
    /// makes the reading valid.
    const fn month_day(self, first: u32, second: u32) -> (u32, u32) {
        let (month, day) = match self {
            Self::DayFirst => (second, first),
            Self::MonthFirst => (first, second),
        };
        swap_impossible_month(month, day)
    }
}

impl fmt::Display for DayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DayFirst => write!(f, "day-first"),
            Self::MonthFirst => write!(f, "month-first"),
        }
    }
}

const fn swap_impossible_month(month: u32, day: u32) -> (u32, u32) {
    if month > 12 && day <= 12 {
        (day, month)
    } else {
        (month, day)
    }
}

/// A digit run together with how many digits it was written with.
#[derive(Debug, Clone, Copy)]
struct Number {
    value: u32,
    digits: usize,
}

impl Number {
    fn parse(token: &str) -> Option<Self> {
        Some(Self {
            value: token.parse().ok()?,
            digits: token.len(),
        })
    }

    /// Three or more digits, or a value no day could have.
    const fn is_year(self) -> bool {
        self.digits >= 3 || self.value > 31
    }

    /// Interprets the number as a year, widening two-digit years.
    fn year(self) -> Option<i32> {
        let value = i32::try_from(self.value).ok()?;
        if self.digits > 2 {
            return Some(value);
        }
        Some(if value < 70 { 2000 + value } else { 1900 + value })
    }
}

/// Parses a raw date candidate under the given day-order assumption.
///
/// Returns `None` when the candidate contains words that are not month,
/// weekday, or filler words, when it holds more fields than a date can,
/// or when the fields do not form a real calendar date and clock time.
pub fn parse_date(candidate: &str, order: DayOrder) -> Option<NaiveDateTime> {
    let (time, rest) = match CLOCK_RE.captures(candidate) {
        Some(caps) => {
            let whole = caps.get(0)?;
            let mut rest = String::with_capacity(candidate.len());
            rest.push_str(&candidate[..whole.start()]);
            rest.push(' ');
            rest.push_str(&candidate[whole.end()..]);
            (Some(clock(&caps)?), rest)
        }
        None => (None, candidate.to_string()),
    };

    let mut numbers = Vec::new();
    let mut month_name = None;
    for token in TOKEN_RE.find_iter(&rest) {
        let token = token.as_str();
        if token.bytes().all(|b| b.is_ascii_digit()) {
            numbers.push(Number::parse(token)?);
            continue;
        }
        let word = token.to_lowercase();
        if let Some(month) = month_from_name(&word) {
            if month_name.replace(month).is_some() {
                return None;
            }
        } else if !is_weekday(&word) && !FILLER_WORDS.contains(&word.as_str()) {
            return None;
        }
    }

    if time.is_none() && numbers.is_empty() && month_name.is_none() {
        return None;
    }

    let (year, month, day) = assemble(&numbers, month_name, order)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.and_time(time.unwrap_or(NaiveTime::MIN)))
}

/// Returns true when the instant sits within a year of the minimal date,
/// meaning the parser recovered no real calendar information.
pub fn is_placeholder(instant: NaiveDateTime) -> bool {
    instant.year() <= PLACEHOLDER_YEAR
}

fn clock(caps: &Captures<'_>) -> Option<NaiveTime> {
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let second: u32 = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    if let Some(meridiem) = caps.get(4) {
        if hour == 0 || hour > 12 {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("p");
        hour = match (pm, hour) {
            (false, 12) => 0,
            (true, 12) | (false, _) => hour,
            (true, _) => hour + 12,
        };
    }

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn month_from_name(word: &str) -> Option<u32> {
    if word.len() < 3 {
        return None;
    }
    let index = MONTHS.iter().position(|month| month.starts_with(word))?;
    u32::try_from(index + 1).ok()
}

fn is_weekday(word: &str) -> bool {
    word.len() >= 3 && WEEKDAYS.iter().any(|day| day.starts_with(word))
}

/// Turns the numeric fields (and an optional month name) into `(year, month, day)`.
fn assemble(
    numbers: &[Number],
    month_name: Option<u32>,
    order: DayOrder,
) -> Option<(i32, u32, u32)> {
    match (month_name, numbers) {
        (Some(month), []) => Some((PLACEHOLDER_YEAR, month, 1)),
        (Some(month), [n]) if n.is_year() => Some((n.year()?, month, 1)),
        (Some(month), [n]) => Some((PLACEHOLDER_YEAR, month, n.value)),
        (Some(month), [a, b]) if a.is_year() => Some((a.year()?, month, b.value)),
        (Some(month), [a, b]) => Some((b.year()?, month, a.value)),
        (None, []) => Some((PLACEHOLDER_YEAR, 1, 1)),
        (None, [n]) if n.is_year() => Some((n.year()?, 1, 1)),
        (None, [n]) => Some((PLACEHOLDER_YEAR, 1, n.value)),
        (None, [a, b]) if a.is_year() => Some((a.year()?, b.value, 1)),
        (None, [a, b]) if b.is_year() => Some((b.year()?, a.value, 1)),
        (None, [a, b]) => {
            let (month, day) = order.month_day(a.value, b.value);
            Some((PLACEHOLDER_YEAR, month, day))
        }
        (None, [a, b, c]) if a.is_year() => {
            let (month, day) = swap_impossible_month(b.value, c.value);
            Some((a.year()?, month, day))
        }
        (None, [a, b, c]) => {
            let (month, day) = order.month_day(a.value, b.value);
            Some((c.year()?, month, day))
        }
        _ => None,
    }
}
