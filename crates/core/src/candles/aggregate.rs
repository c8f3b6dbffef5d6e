//! Hierarchical candle aggregation.

use std::collections::BTreeMap;

use super::calendar::frame_start;
use super::model::Candle;
use barvault_connectors::models::TimeFrame;

/// Reduce finer-grain candles into `target` buckets.
///
/// Source candles are sorted ascending, then folded per calendar
/// bucket: open comes from the first candle, close from the last,
/// high/low are the extremes, volume is summed. The emitted sequence
/// is ascending by bucket start.
///
/// With `skip_open_frame` set, a trailing bucket that is still open at
/// `now` is dropped so an unfinished rollup is never served as final.
/// The live-tail rebuild passes `false` here: it exists precisely to
/// show the still-forming bar.
pub fn aggregate_from_base(
    source: &[Candle],
    target: TimeFrame,
    now: i64,
    skip_open_frame: bool,
) -> Vec<Candle> {
    if source.is_empty() {
        return Vec::new();
    }
    let mut sorted: Vec<&Candle> = source.iter().collect();
    sorted.sort_by_key(|c| c.time);

    let mut buckets: BTreeMap<i64, Candle> = BTreeMap::new();
    for candle in sorted {
        let bucket_start = frame_start(candle.time, target);
        match buckets.get_mut(&bucket_start) {
            None => {
                buckets.insert(
                    bucket_start,
                    Candle {
                        symbol: candle.symbol.clone(),
                        time: bucket_start,
                        open: candle.open,
                        high: candle.high,
                        low: candle.low,
                        close: candle.close,
                        volume: candle.volume,
                    },
                );
            }
            Some(bucket) => {
                bucket.high = bucket.high.max(candle.high);
                bucket.low = bucket.low.min(candle.low);
                bucket.close = candle.close;
                bucket.volume += candle.volume;
            }
        }
    }

    let mut out: Vec<Candle> = buckets.into_values().collect();

    if skip_open_frame {
        if let Some(last) = out.last() {
            if frame_start(last.time, target) == frame_start(now, target) {
                out.pop();
            }
        }
    }
    out
}
