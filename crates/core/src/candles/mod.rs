pub(crate) mod aggregate;
pub(crate) mod calendar;
pub(crate) mod cancel;
pub(crate) mod constants;
pub(crate) mod errors;
pub(crate) mod model;
pub(crate) mod normalize;
pub(crate) mod ranges;
pub(crate) mod sequence;
pub(crate) mod service;
pub(crate) mod store;

#[cfg(test)]
mod service_tests;

// Re-export the public interface
pub use aggregate::aggregate_from_base;
pub use calendar::{
    base_interval, frame_duration_ms, frame_start, is_current_open_frame, round_day,
};
pub use cancel::{cancel_pair, CancelHandle, Canceller};
pub use constants::{BACKFILL_BATCH_SIZE, DAY_MS, MAX_BACKFILL_ATTEMPTS, SOFT_BAR_CAP};
pub use errors::CandleError;
pub use model::{Candle, FinalCandleEvent, HistoryOptions, SeriesKey, TimeRange};
pub use normalize::normalize_and_dedup;
pub use ranges::{merge_ranges, split_by_days};
pub use sequence::check_sequence;
pub use service::{CandleService, CandleServiceTrait};
pub use store::{CachePolicy, CandleStore};
