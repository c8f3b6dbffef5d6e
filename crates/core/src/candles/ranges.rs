//! Splitting requests into day chunks and merging cache misses.

use super::calendar::round_day;
use super::constants::DAY_MS;
use super::model::TimeRange;

/// Split `[from, to)` into contiguous day-aligned chunks, clipping the
/// first and last chunk to the requested bounds.
pub fn split_by_days(from: i64, to: i64) -> Vec<TimeRange> {
    let mut chunks = Vec::new();
    let mut cur = round_day(from);
    let end = round_day(to) + DAY_MS;

    while cur < end {
        let next = cur + DAY_MS;
        let f = from.max(cur);
        let t = to.min(next);
        if f < t {
            chunks.push(TimeRange::new(f, t));
        }
        cur = next;
    }
    chunks
}

/// Merge a set of ranges into the minimal non-overlapping cover.
/// Adjacent ranges (`next.from == cur.to`) are folded together, so the
/// result is the fewest possible upstream requests.
pub fn merge_ranges(ranges: &[TimeRange]) -> Vec<TimeRange> {
    if ranges.is_empty() {
        return Vec::new();
    }
    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|r| r.from);

    let mut out = Vec::new();
    let mut cur = sorted[0];
    for r in &sorted[1..] {
        if r.from <= cur.to {
            cur.to = cur.to.max(r.to);
        } else {
            out.push(cur);
            cur = *r;
        }
    }
    out.push(cur);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_covers_window_with_clipped_edges() {
        let from = 10 * DAY_MS + 5_000;
        let to = 12 * DAY_MS + 1_000;
        let chunks = split_by_days(from, to);
        assert_eq!(
            chunks,
            vec![
                TimeRange::new(from, 11 * DAY_MS),
                TimeRange::new(11 * DAY_MS, 12 * DAY_MS),
                TimeRange::new(12 * DAY_MS, to),
            ]
        );
    }

    #[test]
    fn split_of_aligned_window_has_no_partial_chunks() {
        let chunks = split_by_days(3 * DAY_MS, 5 * DAY_MS);
        assert_eq!(
            chunks,
            vec![
                TimeRange::new(3 * DAY_MS, 4 * DAY_MS),
                TimeRange::new(4 * DAY_MS, 5 * DAY_MS),
            ]
        );
    }

    #[test]
    fn split_within_one_day_yields_one_chunk() {
        let chunks = split_by_days(DAY_MS + 100, DAY_MS + 200);
        assert_eq!(chunks, vec![TimeRange::new(DAY_MS + 100, DAY_MS + 200)]);
    }

    #[test]
    fn merge_folds_overlapping_and_adjacent_ranges() {
        let merged = merge_ranges(&[
            TimeRange::new(0, 10),
            TimeRange::new(5, 15),
            TimeRange::new(20, 30),
        ]);
        assert_eq!(merged, vec![TimeRange::new(0, 15), TimeRange::new(20, 30)]);

        let adjacent = merge_ranges(&[TimeRange::new(10, 20), TimeRange::new(0, 10)]);
        assert_eq!(adjacent, vec![TimeRange::new(0, 20)]);
    }

    #[test]
    fn merge_of_contained_range_keeps_outer_bounds() {
        let merged = merge_ranges(&[TimeRange::new(0, 100), TimeRange::new(10, 20)]);
        assert_eq!(merged, vec![TimeRange::new(0, 100)]);
    }

    #[test]
    fn merge_of_empty_input_is_empty() {
        assert!(merge_ranges(&[]).is_empty());
    }
}
