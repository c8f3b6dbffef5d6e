//! Candle storage trait and cache policy.
//!
//! The cache persists day buckets: for one series key and one UTC day
//! there is at most one live bucket owning its candle rows. Buckets
//! are immutable-replace; nothing ever patches rows in place.

use async_trait::async_trait;

use super::model::{Candle, SeriesKey, TimeRange};
use crate::errors::Result;

/// Engine-level cache behavior, supplied at service construction.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// Never read or write the bucket that contains "now" for the
    /// requested interval; the currently-forming bar is not final.
    pub skip_current_frame: bool,
    /// Replace the whole day bucket on save instead of appending.
    pub replace_day_on_save: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            skip_current_frame: true,
            replace_day_on_save: true,
        }
    }
}

/// Storage interface for day-bucketed candle data.
///
/// Implementations handle persistence only; the current-frame policy
/// checks live in the service so every backend behaves identically.
#[async_trait]
pub trait CandleStore: Send + Sync {
    /// Load the cached candles of one day chunk.
    ///
    /// `range` lies within a single UTC day; the bucket is looked up
    /// by the day containing `range.from`. Returns `None` when no
    /// bucket exists for that day. Rows come back ascending by time,
    /// filtered to `[range.from, range.to)`.
    async fn load_day_chunk(&self, key: &SeriesKey, range: TimeRange)
        -> Result<Option<Vec<Candle>>>;

    /// Persist one day's candles.
    ///
    /// `day` is the full `[day_start, day_start + 24h)` range owning
    /// the rows. With `replace` set, any existing bucket for the same
    /// key and day is deleted together with its rows before the new
    /// bucket is written, atomically from the caller's perspective.
    async fn save_day_bucket(
        &self,
        key: &SeriesKey,
        day: TimeRange,
        candles: &[Candle],
        replace: bool,
    ) -> Result<()>;
}
