//! Candle sequence normalization.

use super::model::Candle;

/// Sort candles ascending by time and drop duplicate timestamps,
/// keeping the last write for each bucket. O(n log n).
pub fn normalize_and_dedup(mut candles: Vec<Candle>) -> Vec<Candle> {
    if candles.is_empty() {
        return candles;
    }
    candles.sort_by_key(|c| c.time);

    let mut out: Vec<Candle> = Vec::with_capacity(candles.len());
    for candle in candles {
        match out.last_mut() {
            Some(last) if last.time == candle.time => *last = candle,
            _ => out.push(candle),
        }
    }
    out
}
