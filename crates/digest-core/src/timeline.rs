//! Turning a noisy per-line instant sequence into a non-decreasing timeline.
//!
//! # Algorithm Summary
//!
//! 1. Smooth: an instant missing or within the jitter threshold of the
//!    previous (already smoothed) instant takes the previous value.
//! 2. Find a longest non-decreasing subsequence that starts at the first
//!    line (patience sort, `O(n log n)`).
//! 3. Forward-fill every line off that subsequence with the accepted
//!    instant immediately before it.

use chrono::{Duration, NaiveDateTime};

/// Replaces missing instants and sub-threshold jitter with the previous value.
///
/// Returns `None` when the first entry is missing, since there is nothing
/// to fill from.
pub fn smooth(resolved: &[Option<NaiveDateTime>], jitter: Duration) -> Option<Vec<NaiveDateTime>> {
    let (first, rest) = resolved.split_first()?;
    let mut smoothed = Vec::with_capacity(resolved.len());
    let mut previous = (*first)?;
    smoothed.push(previous);

    for instant in rest {
        let current = match instant {
            Some(current) if *current - previous < jitter && previous - *current < jitter => {
                previous
            }
            Some(current) => *current,
            None => previous,
        };
        smoothed.push(current);
        previous = current;
    }

    Some(smoothed)
}

/// Returns the indices of a longest non-decreasing subsequence of `values`.
///
/// Each pile keeps the index of its current top; a value goes on the
/// leftmost pile whose top is strictly greater, or starts a new pile.
/// Ties are resolved arbitrarily but the result is always maximal.
pub fn longest_non_decreasing<T: Ord>(values: &[T]) -> Vec<usize> {
    let mut tops: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = vec![None; values.len()];

    for (index, value) in values.iter().enumerate() {
        let pile = tops.partition_point(|&top| values[top] <= *value);
        if pile > 0 {
            predecessors[index] = Some(tops[pile - 1]);
        }
        if pile == tops.len() {
            tops.push(index);
        } else {
            tops[pile] = index;
        }
    }

    let mut path = Vec::with_capacity(tops.len());
    let mut cursor = tops.last().copied();
    while let Some(index) = cursor {
        path.push(index);
        cursor = predecessors[index];
    }
    path.reverse();
    path
}

/// Builds the reconstructed timeline from smoothed instants.
///
/// The first line is the trusted anchor: only later instants at or after it
/// may join the accepted run. The output has the same length as the input
/// and never decreases.
pub fn reconstruct(smoothed: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
    let Some((&anchor, rest)) = smoothed.split_first() else {
        return Vec::new();
    };

    let eligible: Vec<usize> = rest
        .iter()
        .enumerate()
        .filter(|(_, instant)| **instant >= anchor)
        .map(|(offset, _)| offset + 1)
        .collect();
    let eligible_values: Vec<NaiveDateTime> = eligible.iter().map(|&i| smoothed[i]).collect();

    let mut accepted = vec![false; smoothed.len()];
    accepted[0] = true;
    for position in longest_non_decreasing(&eligible_values) {
        accepted[eligible[position]] = true;
    }

    let kept = accepted.iter().filter(|&&a| a).count();
    tracing::debug!(
        lines = smoothed.len(),
        kept,
        filled = smoothed.len() - kept,
        "reconstructed monotonic timeline"
    );

    let mut current = anchor;
    smoothed
        .iter()
        .zip(&accepted)
        .map(|(instant, &on_path)| {
            if on_path {
                current = *instant;
            }
            current
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn ts(minutes: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .expect("valid test timestamp")
            + Duration::minutes(minutes)
    }

    fn jitter() -> Duration {
        Duration::seconds(600)
    }

    fn is_non_decreasing(values: &[NaiveDateTime]) -> bool {
        values.windows(2).all(|pair| pair[0] <= pair[1])
    }

    #[test]
    fn smoothing_collapses_jitter_against_smoothed_value() {
        let resolved = vec![Some(ts(0)), Some(ts(5)), Some(ts(12)), Some(ts(30))];
        let smoothed = smooth(&resolved, jitter()).unwrap();
        // 5 collapses onto 0; 12 is then 12 minutes from 0 and survives.
        assert_eq!(smoothed, vec![ts(0), ts(0), ts(12), ts(30)]);
    }

    #[test]
    fn smoothing_fills_missing_instants() {
        let resolved = vec![Some(ts(0)), None, None, Some(ts(60)), None];
        let smoothed = smooth(&resolved, jitter()).unwrap();
        assert_eq!(smoothed, vec![ts(0), ts(0), ts(0), ts(60), ts(60)]);
    }

    #[test]
    fn smoothing_collapses_small_backward_steps() {
        let resolved = vec![Some(ts(60)), Some(ts(55))];
        let smoothed = smooth(&resolved, jitter()).unwrap();
        assert_eq!(smoothed, vec![ts(60), ts(60)]);
    }

    #[test]
    fn smoothing_requires_an_anchor() {
        assert_eq!(smooth(&[None, Some(ts(0))], jitter()), None);
        assert_eq!(smooth(&[], jitter()), None);
    }

    #[test]
    fn longest_run_of_integers() {
        let values = [3, 1, 4, 1, 5, 9, 2, 6];
        let path = longest_non_decreasing(&values);
        assert_eq!(path.len(), 4);
        assert!(path.windows(2).all(|p| p[0] < p[1]));
        assert!(path.windows(2).all(|p| values[p[0]] <= values[p[1]]));
    }

    #[test]
    fn longest_run_keeps_equal_values() {
        let values = [2, 2, 1, 2, 2];
        assert_eq!(longest_non_decreasing(&values), vec![0, 1, 3, 4]);
        assert!(longest_non_decreasing::<i32>(&[]).is_empty());
    }

    #[test]
    fn earlier_than_anchor_is_forward_filled() {
        let smoothed = vec![ts(0), ts(60), ts(-60), ts(120), ts(180)];
        let timeline = reconstruct(&smoothed);
        assert_eq!(timeline, vec![ts(0), ts(60), ts(60), ts(120), ts(180)]);
    }

    #[test]
    fn outlier_above_the_run_is_forward_filled() {
        let smoothed = vec![ts(0), ts(60), ts(180), ts(120), ts(150)];
        let timeline = reconstruct(&smoothed);
        assert_eq!(timeline, vec![ts(0), ts(60), ts(60), ts(120), ts(150)]);
    }

    #[test]
    fn first_line_stays_anchored() {
        // An unanchored search would prefer the three later lines.
        let smoothed = vec![ts(500), ts(10), ts(20), ts(30)];
        let timeline = reconstruct(&smoothed);
        assert_eq!(timeline, vec![ts(500); 4]);
    }

    #[test]
    fn reconstruction_is_non_decreasing_and_same_length() {
        let smoothed: Vec<_> = [0, 90, 30, 200, 150, 160, 20, 300, 250]
            .into_iter()
            .map(ts)
            .collect();
        let timeline = reconstruct(&smoothed);
        assert_eq!(timeline.len(), smoothed.len());
        assert!(is_non_decreasing(&timeline));
        assert!(reconstruct(&[]).is_empty());
    }
}
