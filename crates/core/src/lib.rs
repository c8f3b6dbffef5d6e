//! Barvault Core - Candle engine, storage traits, and domain models.
//!
//! This crate contains the candle time-series cache-and-aggregation
//! engine. It is database-agnostic and defines the `CandleStore` trait
//! that the `storage-sqlite` crate implements.
//!
//! Given a (connector, market, symbol, timeframe, window) request the
//! engine returns a gap-free, deduplicated, ascending candle sequence,
//! combining the day-bucketed cache with upstream fetches and deriving
//! week/month bars from finer series when upstreams cannot serve them.

pub mod candles;
pub mod errors;

// Re-export common types
pub use candles::{
    CachePolicy, CancelHandle, Candle, CandleService, CandleServiceTrait, CandleStore,
    FinalCandleEvent, HistoryOptions, SeriesKey, TimeRange,
};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
