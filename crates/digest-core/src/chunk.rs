//! Splitting long replies to fit a per-message size limit.

/// Default maximum characters per message.
pub const DEFAULT_CEILING: usize = 4000;

/// Default number of characters before the ceiling searched for a newline.
pub const DEFAULT_LOOKBACK: usize = 300;

/// Splits `text` into ordered chunks of at most `ceiling` characters.
///
/// Each cut prefers to land just after the last newline in the `lookback`
/// characters before the ceiling, and otherwise falls exactly on the
/// ceiling. Lengths are counted in characters, never splitting a code
/// point. Concatenating the chunks reproduces `text`; empty text yields no
/// chunks.
pub fn split_message(text: &str, ceiling: usize, lookback: usize) -> Vec<String> {
    debug_assert!(ceiling > 0, "ceiling must be positive");
    let ceiling = ceiling.max(1);

    let mut parts = Vec::new();
    let mut rest = text;
    // `limit` exists only while more than `ceiling` characters remain.
    while let Some((limit, _)) = rest.char_indices().nth(ceiling) {
        let window_start = rest
            .char_indices()
            .nth(ceiling.saturating_sub(lookback))
            .map_or(0, |(offset, _)| offset);
        let cut = rest[window_start..limit]
            .rfind('\n')
            .map_or(limit, |newline| window_start + newline + 1);
        let (head, tail) = rest.split_at(cut);
        parts.push(head.to_string());
        rest = tail;
    }
    if !rest.is_empty() {
        parts.push(rest.to_string());
    }
    parts
}
