use std::time::Duration;

/// One UTC day in milliseconds; the cache's storage granularity.
pub const DAY_MS: i64 = 86_400_000;

/// Maximum candles a single fast-path history request may return.
/// The request window is pulled forward until it fits.
pub const SOFT_BAR_CAP: i64 = 500;

/// Upper bound on in-flight day requests during a slow backfill batch.
pub const BACKFILL_BATCH_SIZE: usize = 50;

/// Retries allowed for a failing backfill batch before giving up.
pub const MAX_BACKFILL_ATTEMPTS: u32 = 5;

/// Base delay for exponential backfill backoff (doubled per attempt).
pub const BACKFILL_BASE_DELAY: Duration = Duration::from_secs(10);
