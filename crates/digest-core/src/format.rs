//! Line format detection and raw date extraction.

/// Leading characters some exporters put before the first bracket.
const INVISIBLE_PREFIX: [char; 2] = ['\u{feff}', '\u{200e}'];

/// How each transcript line carries its leading date token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    /// `[01/02/2023, 09:00:00] Alice: hi`
    Bracket,
    /// `01/02/2023, 09:00 - Alice: hi`
    Hyphen,
}

impl LineFormat {
    /// Decides the format for a whole transcript from its first non-empty line.
    ///
    /// The decision is global; it is never re-evaluated per line.
    pub fn detect(first_line: &str) -> Self {
        if first_line
            .trim_start_matches(INVISIBLE_PREFIX)
            .starts_with('[')
        {
            Self::Bracket
        } else {
            Self::Hyphen
        }
    }

    /// Returns the raw date substring of a line, or `None` when the line
    /// lacks the delimiter this format expects.
    pub fn candidate(self, line: &str) -> Option<&str> {
        match self {
            Self::Bracket => {
                let open = line.find('[')?;
                let inner = &line[open + 1..];
                let close = inner.find(']')?;
                Some(&inner[..close])
            }
            Self::Hyphen => line.find('-').map(|end| &line[..end]),
        }
    }
}

/// Extracts one optional date candidate per line, in line order.
pub fn extract_candidates<'a>(lines: &[&'a str], format: LineFormat) -> Vec<Option<&'a str>> {
    lines.iter().map(|line| format.candidate(line)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bracket_format() {
        assert_eq!(
            LineFormat::detect("[01/02/2023, 09:00:00] Alice: hi"),
            LineFormat::Bracket
        );
        assert_eq!(
            LineFormat::detect("\u{200e}[01/02/2023, 09:00:00] Alice: hi"),
            LineFormat::Bracket
        );
    }

    #[test]
    fn everything_else_is_hyphen_format() {
        assert_eq!(
            LineFormat::detect("01/02/2023, 09:00 - Alice: hi"),
            LineFormat::Hyphen
        );
        assert_eq!(LineFormat::detect("random text"), LineFormat::Hyphen);
    }

    #[test]
    fn bracket_candidate_is_text_between_brackets() {
        let format = LineFormat::Bracket;
        assert_eq!(
            format.candidate("[01/02/2023, 09:00:00] Alice: hi"),
            Some("01/02/2023, 09:00:00")
        );
        assert_eq!(format.candidate("wrapped message body"), None);
        assert_eq!(format.candidate("[unterminated"), None);
        assert_eq!(format.candidate("a] then [b]"), Some("b"));
    }

    #[test]
    fn hyphen_candidate_is_text_before_first_hyphen() {
        let format = LineFormat::Hyphen;
        assert_eq!(
            format.candidate("1/2/23, 9:00 AM - Alice: hi - again"),
            Some("1/2/23, 9:00 AM ")
        );
        assert_eq!(format.candidate("no delimiter here"), None);
    }

    #[test]
    fn extracts_one_candidate_per_line() {
        let lines = ["[1/2/23] a", "", "body", "[3/4/23] b"];
        let candidates = extract_candidates(&lines, LineFormat::Bracket);
        assert_eq!(candidates, vec![Some("1/2/23"), None, None, Some("3/4/23")]);
    }
}
