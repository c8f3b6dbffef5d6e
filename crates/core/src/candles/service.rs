//! The candle service: range resolver, history orchestrator, and live
//! tail ingestion.
//!
//! `ensure_range` is the engine's state machine: cache-hit/miss
//! detection per day chunk, hole merging, upstream fetches with the
//! week/month -> day -> 1m fallback chain, persistence, and live-tail
//! recomputation for in-progress bars. `create_history` sits on top
//! and picks the single-shot fast path or the day-chunked backfill
//! path with bounded retry/backoff.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::{try_join_all, BoxFuture};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::aggregate::aggregate_from_base;
use super::calendar::{base_interval, frame_start, is_current_open_frame, round_day};
use super::cancel::CancelHandle;
use super::constants::{
    BACKFILL_BASE_DELAY, BACKFILL_BATCH_SIZE, DAY_MS, MAX_BACKFILL_ATTEMPTS, SOFT_BAR_CAP,
};
use super::errors::CandleError;
use super::model::{Candle, FinalCandleEvent, HistoryOptions, SeriesKey, TimeRange};
use super::normalize::normalize_and_dedup;
use super::ranges::{merge_ranges, split_by_days};
use super::sequence::check_sequence;
use super::store::{CachePolicy, CandleStore};
use crate::errors::Result;
use barvault_connectors::models::{ConnectorKind, MarketKind, TimeFrame};
use barvault_connectors::registry::ConnectorRegistry;
use barvault_connectors::source::DataSource;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Consumer-facing candle operations.
#[async_trait]
pub trait CandleServiceTrait: Send + Sync {
    /// Fetch ascending history for every symbol in the request.
    async fn get_history(&self, options: HistoryOptions) -> Result<Vec<Candle>>;

    /// Like [`get_history`](Self::get_history) with an optional cancel
    /// handle observed by the slow backfill path.
    async fn create_history(
        &self,
        options: HistoryOptions,
        cancel: Option<CancelHandle>,
    ) -> Result<Vec<Candle>>;

    /// Descending history for one symbol with the default lookback
    /// (7 days, or 100 for the day interval).
    async fn get(
        &self,
        connector: ConnectorKind,
        market: MarketKind,
        symbol: &str,
        interval: TimeFrame,
    ) -> Result<Vec<Candle>>;

    /// Ingest a finalized bar pushed by the live feed.
    async fn upsert_final_candle(&self, event: FinalCandleEvent) -> Result<()>;
}

/// Candle engine over a [`CandleStore`] and a [`ConnectorRegistry`].
pub struct CandleService<S: CandleStore> {
    store: Arc<S>,
    registry: Arc<ConnectorRegistry>,
    policy: CachePolicy,
}

impl<S: CandleStore> CandleService<S> {
    pub fn new(store: Arc<S>, registry: Arc<ConnectorRegistry>, policy: CachePolicy) -> Self {
        Self {
            store,
            registry,
            policy,
        }
    }

    // =========================================================================
    // Cache access
    // =========================================================================

    /// Load one day chunk from the cache, applying the current-frame
    /// policy: the bucket of the day containing `now` is never read,
    /// and a stored bar still inside the open frame of the requested
    /// interval is dropped rather than served as final.
    async fn load_local_chunk(
        &self,
        key: &SeriesKey,
        chunk: TimeRange,
        now: i64,
    ) -> Result<Option<Vec<Candle>>> {
        if self.policy.skip_current_frame && round_day(chunk.from) == round_day(now) {
            return Ok(None);
        }

        let Some(mut rows) = self.store.load_day_chunk(key, chunk).await? else {
            return Ok(None);
        };

        if let Some(last) = rows.last() {
            if is_current_open_frame(last.time, now, key.interval) {
                rows.pop();
            }
        }
        Ok(Some(rows))
    }

    /// Group candles by their owning UTC day and persist each group as
    /// one bucket. The day containing `now` is skipped under the
    /// current-frame policy; a bucket holding a still-forming day must
    /// never exist, or it would later be served as complete.
    async fn save_by_days(&self, key: &SeriesKey, candles: &[Candle]) -> Result<()> {
        if candles.is_empty() {
            return Ok(());
        }
        let now = now_ms();

        let mut by_day: BTreeMap<i64, Vec<Candle>> = BTreeMap::new();
        for candle in candles {
            by_day
                .entry(round_day(candle.time))
                .or_default()
                .push(candle.clone());
        }

        for (day_start, rows) in by_day {
            if self.policy.skip_current_frame && day_start == round_day(now) {
                debug!(
                    "Skipping persist of open day bucket {} for {}",
                    day_start, key.symbol
                );
                continue;
            }
            let day = TimeRange::new(day_start, day_start + DAY_MS);
            self.store
                .save_day_bucket(key, day, &rows, self.policy.replace_day_on_save)
                .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Upstream access
    // =========================================================================

    async fn fetch_hole(
        &self,
        key: &SeriesKey,
        hole: TimeRange,
        source: &Arc<dyn DataSource>,
    ) -> Result<Vec<Candle>> {
        let raw = source
            .fetch_candles(key.market, &key.symbol, key.interval, hole.from, hole.to)
            .await?;
        Ok(raw.into_iter().map(Candle::from).collect())
    }

    /// Resolve day-level bars for the holes of a week/month request:
    /// local day cache first, then a day fetch, then synthesis from
    /// 1-minute bars when the upstream has no day data for the hole.
    async fn resolve_day_holes(
        &self,
        key: &SeriesKey,
        holes: &[TimeRange],
        source: &Arc<dyn DataSource>,
        now: i64,
        skip_persist: bool,
    ) -> Result<Vec<Candle>> {
        let day_key = key.with_interval(TimeFrame::Day);
        let minute_key = key.with_interval(TimeFrame::Min1);
        let mut day_bars = Vec::new();

        for hole in holes {
            let mut day_missing = Vec::new();
            for chunk in split_by_days(hole.from, hole.to) {
                match self.load_local_chunk(&day_key, chunk, now).await? {
                    Some(local) if !local.is_empty() => day_bars.extend(local),
                    _ => day_missing.push(chunk),
                }
            }

            for day_hole in merge_ranges(&day_missing) {
                let fetched_day = self.fetch_hole(&day_key, day_hole, source).await?;
                if !fetched_day.is_empty() {
                    if !skip_persist {
                        self.save_by_days(&day_key, &fetched_day).await?;
                    }
                    day_bars.extend(fetched_day);
                } else {
                    debug!(
                        "No day bars upstream for {} [{}, {}), synthesizing from 1m",
                        key.symbol, day_hole.from, day_hole.to
                    );
                    let fetched_minutes = self.fetch_hole(&minute_key, day_hole, source).await?;
                    if !skip_persist {
                        self.save_by_days(&minute_key, &fetched_minutes).await?;
                    }
                    let day_from_minutes = aggregate_from_base(
                        &fetched_minutes,
                        TimeFrame::Day,
                        now,
                        self.policy.skip_current_frame,
                    );
                    if !skip_persist {
                        self.save_by_days(&day_key, &day_from_minutes).await?;
                    }
                    day_bars.extend(day_from_minutes);
                }
            }
        }
        Ok(day_bars)
    }

    // =========================================================================
    // Range resolver
    // =========================================================================

    /// Resolve `[range.from, range.to)` for one series, combining the
    /// cache with upstream fetches. The returned sequence is gap-free
    /// within what the cache and upstream can provide, deduplicated,
    /// and ascending.
    pub async fn ensure_range(
        &self,
        key: SeriesKey,
        range: TimeRange,
        source: &Arc<dyn DataSource>,
        persist_aggregated: bool,
    ) -> Result<Vec<Candle>> {
        if key.interval.is_calendar() && range.from % DAY_MS != 0 {
            return Err(CandleError::MisalignedDayRange { from: range.from }.into());
        }
        self.ensure_range_inner(key, range, source, persist_aggregated, true)
            .await
    }

    /// `rebuild_tail` bounds the recursion: the live-tail pass resolves
    /// the base interval with it unset, and the base map strictly
    /// reduces granularity (week/month -> day), so the depth is at
    /// most one regardless of configuration.
    fn ensure_range_inner<'a>(
        &'a self,
        key: SeriesKey,
        range: TimeRange,
        source: &'a Arc<dyn DataSource>,
        persist_aggregated: bool,
        rebuild_tail: bool,
    ) -> BoxFuture<'a, Result<Vec<Candle>>> {
        Box::pin(async move {
            let now = now_ms();
            let interval = key.interval;
            let skip_persist =
                self.policy.skip_current_frame && range.to > frame_start(now, interval);

            // 1) read the cache day by day
            //
            // A calendar-frame candle owns a multi-day span but lives in
            // the day bucket of its frame start, so later day chunks of
            // an already-collected frame are covered, not missing.
            let mut collected: Vec<Candle> = Vec::new();
            let mut covered_frames: HashSet<i64> = HashSet::new();
            let mut missing = Vec::new();
            for chunk in split_by_days(range.from, range.to) {
                if interval.is_calendar()
                    && covered_frames.contains(&frame_start(chunk.from, interval))
                {
                    continue;
                }
                match self.load_local_chunk(&key, chunk, now).await? {
                    Some(local) if !local.is_empty() => {
                        if interval.is_calendar() {
                            covered_frames.extend(local.iter().map(|c| c.time));
                        }
                        collected.extend(local);
                    }
                    _ => missing.push(chunk),
                }
            }

            // 2) fill the holes
            if !missing.is_empty() {
                let holes = merge_ranges(&missing);
                debug!(
                    "{}/{} {} {}: {} hole(s) to resolve upstream",
                    key.connector,
                    key.market,
                    key.symbol,
                    interval,
                    holes.len()
                );

                if interval.is_calendar() {
                    let day_bars = self
                        .resolve_day_holes(&key, &holes, source, now, skip_persist)
                        .await?;
                    let aggregated = aggregate_from_base(
                        &day_bars,
                        interval,
                        now,
                        self.policy.skip_current_frame,
                    );
                    if persist_aggregated && !skip_persist {
                        self.save_by_days(&key, &aggregated).await?;
                    }
                    collected.extend(aggregated);
                } else {
                    // Fixed frames, 1m included: upstream serves bars at
                    // exactly this resolution, no local rollup needed.
                    for hole in &holes {
                        let fetched = self.fetch_hole(&key, *hole, source).await?;
                        if !skip_persist {
                            self.save_by_days(&key, &fetched).await?;
                        }
                        collected.extend(fetched);
                    }
                }
            }

            // 3) normalize, then rebuild the live tail of a rollup
            let normalized = normalize_and_dedup(collected);

            let base = base_interval(interval);
            if rebuild_tail
                && !normalized.is_empty()
                && self.policy.skip_current_frame
                && base != interval
                && range.to > frame_start(now, interval)
            {
                let last_time = normalized[normalized.len() - 1].time;
                let tail_start = frame_start(last_time, interval);
                let base_candles = self
                    .ensure_range_inner(
                        key.with_interval(base),
                        TimeRange::new(tail_start, now),
                        source,
                        true,
                        false,
                    )
                    .await?;
                // Keep the open bucket here: this pass exists to show
                // the still-forming bar. It is never persisted.
                let rebuilt = aggregate_from_base(&base_candles, interval, now, false);
                let mut spliced: Vec<Candle> = normalized
                    .into_iter()
                    .filter(|c| c.time < tail_start)
                    .collect();
                spliced.extend(rebuilt);
                return Ok(normalize_and_dedup(spliced));
            }

            Ok(normalized)
        })
    }

    // =========================================================================
    // History orchestration
    // =========================================================================

    /// Resolve one window for every requested symbol, running the
    /// sequence diagnostics for connectors that promise strictly
    /// stepped bars.
    async fn request_symbols(
        &self,
        connector: ConnectorKind,
        market: MarketKind,
        symbols: &[String],
        interval: TimeFrame,
        range: TimeRange,
        source: &Arc<dyn DataSource>,
        persist_aggregated: bool,
    ) -> Result<Vec<Candle>> {
        let mut out = Vec::new();
        for symbol in symbols {
            let key = SeriesKey::new(connector, market, symbol.clone(), interval);
            let part = self
                .ensure_range(key, range, source, persist_aggregated)
                .await?;
            out.extend(part);
        }

        if source.strict_sequence() {
            check_sequence(interval, &out);
        }
        Ok(out)
    }

    /// Walk the window day by day at day granularity, keeping at most
    /// [`BACKFILL_BATCH_SIZE`] day requests in flight. A failing batch
    /// is discarded wholesale; progress rolls back to the last
    /// confirmed boundary and the walk resumes after an exponential
    /// backoff, up to [`MAX_BACKFILL_ATTEMPTS`].
    async fn backfill_days(
        &self,
        connector: ConnectorKind,
        market: MarketKind,
        symbols: &[String],
        window: TimeRange,
        source: &Arc<dyn DataSource>,
        cancel: Option<&CancelHandle>,
    ) -> Result<()> {
        let mut cursor = window.from;
        let mut attempts: u32 = 0;

        while cursor < window.to {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(CandleError::Cancelled.into());
            }

            let mut batch = Vec::new();
            let mut next = cursor;
            while next < window.to && batch.len() < BACKFILL_BATCH_SIZE {
                let day_to = (next + DAY_MS).min(window.to);
                batch.push(TimeRange::new(next, day_to));
                next = day_to;
            }

            let requests = batch.iter().map(|day| {
                self.request_symbols(connector, market, symbols, TimeFrame::Day, *day, source, true)
            });

            match try_join_all(requests).await {
                Ok(parts) => {
                    let bars: usize = parts.iter().map(|p| p.len()).sum();
                    debug!("Backfill confirmed up to {} ({} day bars)", next, bars);
                    cursor = next;
                    attempts = 0;
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= MAX_BACKFILL_ATTEMPTS {
                        warn!("Backfill exhausted after {} attempts: {}", attempts, e);
                        return Err(CandleError::BackfillExhausted { attempts }.into());
                    }
                    let delay = BACKFILL_BASE_DELAY * 2u32.pow(attempts);
                    warn!(
                        "Backfill batch failed (attempt {}), resuming from {} in {:?}: {}",
                        attempts, cursor, delay, e
                    );
                    if cancel.is_some_and(|c| c.is_cancelled()) {
                        return Err(CandleError::Cancelled.into());
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: CandleStore> CandleServiceTrait for CandleService<S> {
    async fn get_history(&self, options: HistoryOptions) -> Result<Vec<Candle>> {
        self.create_history(options, None).await
    }

    async fn create_history(
        &self,
        options: HistoryOptions,
        cancel: Option<CancelHandle>,
    ) -> Result<Vec<Candle>> {
        let HistoryOptions {
            connector,
            market,
            symbols,
            interval,
            days,
            gap_days,
        } = options;

        let source = self
            .registry
            .get(connector)
            .ok_or_else(|| CandleError::UnsupportedConnector(connector.to_string()))?
            .clone();

        let days = match days {
            Some(d) if d > 0 => d,
            _ => return Err(CandleError::MissingDays.into()),
        };
        let gap_days = gap_days.unwrap_or(0);

        let now = now_ms();
        let stamp = if gap_days > 0 { round_day(now) } else { now };
        let end = stamp - DAY_MS * gap_days;
        let from = round_day(end - DAY_MS * days);

        info!(
            "History request {}/{} tf={} days={} symbols={:?}",
            connector, market, interval, days, symbols
        );

        if let Some(frame) = interval.fixed_duration_ms() {
            // Fast path: one request over the whole window, clipped to
            // the last closed bar and to the soft bar cap.
            let end_safe = end.min(frame_start(now, interval) - 1);
            let clipped_from = from.max(end - SOFT_BAR_CAP * frame + 1);
            return self
                .request_symbols(
                    connector,
                    market,
                    &symbols,
                    interval,
                    TimeRange::new(clipped_from, end_safe),
                    &source,
                    true,
                )
                .await;
        }

        // Slow path for week/month: warm the day cache with the
        // batched, retrying walk, then aggregate the whole window at
        // the requested interval (resolving against the warm cache).
        let window = TimeRange::new(from, end);
        self.backfill_days(connector, market, &symbols, window, &source, cancel.as_ref())
            .await?;
        self.request_symbols(connector, market, &symbols, interval, window, &source, true)
            .await
    }

    async fn get(
        &self,
        connector: ConnectorKind,
        market: MarketKind,
        symbol: &str,
        interval: TimeFrame,
    ) -> Result<Vec<Candle>> {
        let days = if interval == TimeFrame::Day { 100 } else { 7 };

        let mut candles = self
            .get_history(HistoryOptions {
                connector,
                market,
                symbols: vec![symbol.to_string()],
                interval,
                days: Some(days),
                gap_days: Some(0),
            })
            .await?;

        // Timestamps are unique after normalization, so reversing is
        // all that is left to do for the descending contract.
        candles.reverse();
        Ok(candles)
    }

    async fn upsert_final_candle(&self, event: FinalCandleEvent) -> Result<()> {
        let now = now_ms();
        let candle = Candle::from(event.candle);

        if self.policy.skip_current_frame
            && is_current_open_frame(candle.time, now, event.interval)
        {
            debug!(
                "Ignoring 'final' {} candle still in its open frame: {} @ {}",
                event.interval, event.symbol, candle.time
            );
            return Ok(());
        }

        let key = SeriesKey::new(event.connector, event.market, event.symbol, event.interval);
        self.save_by_days(&key, &[candle]).await
    }
}
