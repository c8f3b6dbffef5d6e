//! Non-fatal sequence diagnostics.
//!
//! Run after fetches from connectors that promise strictly-stepped
//! bars. Findings are logged, never raised; a gap in an upstream
//! series is an observation, not a failure of this engine.

use log::warn;

use super::calendar::frame_start;
use super::model::Candle;
use barvault_connectors::models::TimeFrame;

/// Check fixed-step continuity (fixed frames) or calendar-bucket
/// uniqueness (week/month) over an ascending candle sequence.
pub fn check_sequence(interval: TimeFrame, candles: &[Candle]) {
    if candles.len() < 2 {
        return;
    }

    match interval.fixed_duration_ms() {
        None => {
            for pair in candles.windows(2) {
                let cur = frame_start(pair[0].time, interval);
                let next = frame_start(pair[1].time, interval);
                if cur == next {
                    warn!(
                        "Duplicate {} bucket at {} for {}",
                        interval, cur, pair[0].symbol
                    );
                }
            }
        }
        Some(step) => {
            for pair in candles.windows(2) {
                if pair[1].time != pair[0].time + step {
                    warn!(
                        "Sequence gap for {} {}: {} -> {}",
                        pair[0].symbol, interval, pair[0].time, pair[1].time
                    );
                }
            }
        }
    }
}
