//! Tests for the CandleService contracts and edge cases.
//!
//! These cover the engine-level properties:
//!
//! 1. Idempotence: resolving a fully closed range twice performs zero
//!    upstream fetches the second time
//! 2. Fallback chain: week bars derive from day bars, which derive
//!    from 1-minute bars when the upstream has no day data
//! 3. Current-frame exclusion: persisted buckets covering "now" are
//!    never served
//! 4. Backfill retry: batches roll back and retry with backoff up to
//!    the attempt bound
//! 5. Consumer API: descending `get`, soft bar cap, live-tail ingest

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::calendar::{frame_start, round_day};
use super::constants::{DAY_MS, MAX_BACKFILL_ATTEMPTS, SOFT_BAR_CAP};
use super::model::{Candle, FinalCandleEvent, HistoryOptions, SeriesKey, TimeRange};
use super::service::{CandleService, CandleServiceTrait};
use super::store::{CachePolicy, CandleStore};
use crate::candles::{cancel_pair, CandleError};
use crate::errors::{Error, Result};
use barvault_connectors::errors::ConnectorError;
use barvault_connectors::models::{ConnectorKind, MarketKind, ProviderCandle, TimeFrame};
use barvault_connectors::registry::ConnectorRegistry;
use barvault_connectors::source::DataSource;

// 2025-01-06 00:00:00 UTC, a Monday; all fixed test windows are in the
// past relative to any clock this suite runs under.
const MONDAY: i64 = 1_736_121_600_000;
const MIN: i64 = 60_000;
const HOUR: i64 = 60 * MIN;

// =============================================================================
// Mock CandleStore
// =============================================================================

#[derive(Default)]
struct MockStore {
    buckets: Mutex<HashMap<(SeriesKey, i64), Vec<Candle>>>,
    saves: AtomicUsize,
}

impl MockStore {
    fn new() -> Self {
        Self::default()
    }

    fn seed(&self, key: &SeriesKey, day_start: i64, rows: Vec<Candle>) {
        self.buckets
            .lock()
            .unwrap()
            .insert((key.clone(), day_start), rows);
    }

    fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn bucket(&self, key: &SeriesKey, day_start: i64) -> Option<Vec<Candle>> {
        self.buckets
            .lock()
            .unwrap()
            .get(&(key.clone(), day_start))
            .cloned()
    }
}

#[async_trait]
impl CandleStore for MockStore {
    async fn load_day_chunk(
        &self,
        key: &SeriesKey,
        range: TimeRange,
    ) -> Result<Option<Vec<Candle>>> {
        let buckets = self.buckets.lock().unwrap();
        let Some(rows) = buckets.get(&(key.clone(), round_day(range.from))) else {
            return Ok(None);
        };
        let mut out: Vec<Candle> = rows
            .iter()
            .filter(|c| range.contains(c.time))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.time);
        Ok(Some(out))
    }

    async fn save_day_bucket(
        &self,
        key: &SeriesKey,
        day: TimeRange,
        candles: &[Candle],
        replace: bool,
    ) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut buckets = self.buckets.lock().unwrap();
        let slot = buckets.entry((key.clone(), day.from)).or_default();
        if replace {
            slot.clear();
        }
        slot.extend(candles.iter().cloned());
        slot.sort_by_key(|c| c.time);
        Ok(())
    }
}

// =============================================================================
// Mock DataSource
// =============================================================================

/// Synthesizes deterministic bars for any fixed frame. Day bars can be
/// switched off to force the 1-minute fallback; every fetch is logged.
struct MockSource {
    serve_day_bars: bool,
    fail_all: AtomicBool,
    fetch_log: Mutex<Vec<(TimeFrame, i64, i64)>>,
}

impl MockSource {
    fn new() -> Self {
        Self {
            serve_day_bars: true,
            fail_all: AtomicBool::new(false),
            fetch_log: Mutex::new(Vec::new()),
        }
    }

    fn without_day_bars() -> Self {
        Self {
            serve_day_bars: false,
            ..Self::new()
        }
    }

    fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    fn fetch_count(&self) -> usize {
        self.fetch_log.lock().unwrap().len()
    }

    fn fetches_at(&self, interval: TimeFrame) -> usize {
        self.fetch_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(tf, _, _)| *tf == interval)
            .count()
    }

    fn close_at(step_index: i64) -> f64 {
        100.0 + (step_index % 97) as f64
    }
}

#[async_trait]
impl DataSource for MockSource {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Binance
    }

    fn strict_sequence(&self) -> bool {
        true
    }

    async fn fetch_candles(
        &self,
        _market: MarketKind,
        symbol: &str,
        interval: TimeFrame,
        from: i64,
        to: i64,
    ) -> std::result::Result<Vec<ProviderCandle>, ConnectorError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(ConnectorError::Network {
                connector: "binance".to_string(),
                message: "connection reset".to_string(),
            });
        }
        self.fetch_log.lock().unwrap().push((interval, from, to));

        if interval == TimeFrame::Day && !self.serve_day_bars {
            return Ok(Vec::new());
        }
        let step = interval.fixed_duration_ms().ok_or_else(|| {
            ConnectorError::UnsupportedInterval {
                connector: "binance".to_string(),
                interval: interval.to_string(),
            }
        })?;

        let mut out = Vec::new();
        let mut t = from.div_euclid(step) * step;
        if t < from {
            t += step;
        }
        while t < to {
            let close = Self::close_at(t / step);
            out.push(ProviderCandle {
                symbol: symbol.to_string(),
                time: t,
                o: close - 0.5,
                h: close + 1.0,
                l: close - 1.0,
                c: close,
                v: 3.0,
            });
            t += step;
        }
        Ok(out)
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    service: CandleService<MockStore>,
    store: Arc<MockStore>,
    source: Arc<MockSource>,
    source_dyn: Arc<dyn DataSource>,
}

fn harness_with(source: MockSource) -> Harness {
    let store = Arc::new(MockStore::new());
    let source = Arc::new(source);
    let source_dyn: Arc<dyn DataSource> = source.clone();
    let mut registry = ConnectorRegistry::new();
    registry.register(source_dyn.clone());
    let service = CandleService::new(store.clone(), Arc::new(registry), CachePolicy::default());
    Harness {
        service,
        store,
        source,
        source_dyn,
    }
}

fn harness() -> Harness {
    harness_with(MockSource::new())
}

fn key(interval: TimeFrame) -> SeriesKey {
    SeriesKey::new(ConnectorKind::Binance, MarketKind::Spot, "BTCUSDT", interval)
}

fn assert_ascending_unique(candles: &[Candle]) {
    for pair in candles.windows(2) {
        assert!(pair[0].time < pair[1].time, "sequence not strictly ascending");
    }
}

// =============================================================================
// Range resolver
// =============================================================================

#[tokio::test]
async fn closed_range_is_idempotent_with_zero_refetches() {
    let h = harness();
    let range = TimeRange::new(MONDAY, MONDAY + 2 * DAY_MS);

    let first = h
        .service
        .ensure_range(key(TimeFrame::H1), range, &h.source_dyn, true)
        .await
        .unwrap();
    assert_eq!(first.len(), 48);
    assert_ascending_unique(&first);
    let fetches_after_first = h.source.fetch_count();
    assert!(fetches_after_first > 0);
    assert!(h.store.save_count() > 0);

    let second = h
        .service
        .ensure_range(key(TimeFrame::H1), range, &h.source_dyn, true)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(h.source.fetch_count(), fetches_after_first);
}

#[tokio::test]
async fn week_bars_derive_from_minutes_when_upstream_has_no_day_data() {
    let h = harness_with(MockSource::without_day_bars());
    // Two full ISO weeks, day-aligned on Mondays.
    let range = TimeRange::new(MONDAY, MONDAY + 14 * DAY_MS);

    let weeks = h
        .service
        .ensure_range(key(TimeFrame::Week), range, &h.source_dyn, true)
        .await
        .unwrap();

    assert_eq!(weeks.len(), 2);
    assert_eq!(weeks[0].time, MONDAY);
    assert_eq!(weeks[1].time, MONDAY + 7 * DAY_MS);
    assert_ascending_unique(&weeks);

    // The chain touched upstream day bars first, then fell back to 1m.
    assert!(h.source.fetches_at(TimeFrame::Day) > 0);
    assert!(h.source.fetches_at(TimeFrame::Min1) > 0);

    // Derived day and week buckets were persisted alongside the raw 1m.
    assert!(h.store.bucket(&key(TimeFrame::Min1), MONDAY).is_some());
    let day_bucket = h.store.bucket(&key(TimeFrame::Day), MONDAY).unwrap();
    assert_eq!(day_bucket.len(), 1);
    assert_eq!(day_bucket[0].time, MONDAY);
    let week_bucket = h.store.bucket(&key(TimeFrame::Week), MONDAY).unwrap();
    assert_eq!(week_bucket[0].time, MONDAY);

    // Week OHLCV folds the minute path: volume is the full sum.
    assert_eq!(weeks[0].volume, 3.0 * 7.0 * 24.0 * 60.0);
}

#[tokio::test]
async fn second_week_request_resolves_from_cache() {
    let h = harness_with(MockSource::without_day_bars());
    let range = TimeRange::new(MONDAY, MONDAY + 7 * DAY_MS);

    let first = h
        .service
        .ensure_range(key(TimeFrame::Week), range, &h.source_dyn, true)
        .await
        .unwrap();
    let fetches = h.source.fetch_count();

    let second = h
        .service
        .ensure_range(key(TimeFrame::Week), range, &h.source_dyn, true)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(h.source.fetch_count(), fetches);
}

#[tokio::test]
async fn misaligned_calendar_request_is_rejected() {
    let h = harness();
    let err = h
        .service
        .ensure_range(
            key(TimeFrame::Week),
            TimeRange::new(MONDAY + 5, MONDAY + 7 * DAY_MS),
            &h.source_dyn,
            true,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Candle(CandleError::MisalignedDayRange { .. })
    ));
}

#[tokio::test]
async fn persisted_bucket_covering_now_is_never_served() {
    let h = harness();
    let today = round_day(chrono::Utc::now().timestamp_millis());
    let k = key(TimeFrame::Min1);

    // A poisoned bucket for today: if the cache served it, closes of
    // 999 would surface in the result.
    let poisoned: Vec<Candle> = (0..5)
        .map(|i| Candle {
            symbol: "BTCUSDT".to_string(),
            time: today + i * MIN,
            open: 999.0,
            high: 999.0,
            low: 999.0,
            close: 999.0,
            volume: 999.0,
        })
        .collect();
    h.store.seed(&k, today, poisoned);

    let out = h
        .service
        .ensure_range(
            k,
            TimeRange::new(today, today + 5 * MIN),
            &h.source_dyn,
            true,
        )
        .await
        .unwrap();

    assert!(h.source.fetch_count() > 0, "cache must not satisfy today");
    assert!(out.iter().all(|c| c.close != 999.0));
}

#[tokio::test]
async fn historical_buckets_are_replaced_not_merged() {
    let h = harness();
    let k = key(TimeFrame::H1);

    // Stale bucket with an alien row; a replace-on-save must drop it.
    h.store.seed(
        &k,
        MONDAY,
        vec![Candle {
            symbol: "BTCUSDT".to_string(),
            time: MONDAY + 30 * MIN, // not an H1 frame start
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
        }],
    );

    // The seeded bucket satisfies the read, so force a refetch of the
    // same day through the live feed write path instead.
    let bar = ProviderCandle {
        symbol: "BTCUSDT".to_string(),
        time: MONDAY,
        o: 2.0,
        h: 2.0,
        l: 2.0,
        c: 2.0,
        v: 2.0,
    };
    h.service
        .upsert_final_candle(FinalCandleEvent {
            connector: ConnectorKind::Binance,
            market: MarketKind::Spot,
            symbol: "BTCUSDT".to_string(),
            interval: TimeFrame::H1,
            candle: bar,
        })
        .await
        .unwrap();

    let bucket = h.store.bucket(&k, MONDAY).unwrap();
    assert_eq!(bucket.len(), 1);
    assert_eq!(bucket[0].time, MONDAY);
    assert_eq!(bucket[0].close, 2.0);
}

// =============================================================================
// History orchestration
// =============================================================================

fn history_options(interval: TimeFrame, days: i64) -> HistoryOptions {
    HistoryOptions {
        connector: ConnectorKind::Binance,
        market: MarketKind::Spot,
        symbols: vec!["BTCUSDT".to_string()],
        interval,
        days: Some(days),
        gap_days: None,
    }
}

#[tokio::test]
async fn missing_days_is_a_domain_error() {
    let h = harness();
    let mut options = history_options(TimeFrame::H1, 1);
    options.days = None;
    let err = h.service.get_history(options).await.unwrap_err();
    assert!(matches!(err, Error::Candle(CandleError::MissingDays)));

    let err = h
        .service
        .get_history(history_options(TimeFrame::H1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Candle(CandleError::MissingDays)));
}

#[tokio::test]
async fn unregistered_connector_is_rejected() {
    let h = harness();
    let mut options = history_options(TimeFrame::H1, 1);
    options.connector = ConnectorKind::Alpaca;
    let err = h.service.get_history(options).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Candle(CandleError::UnsupportedConnector(_))
    ));
}

#[tokio::test]
async fn fast_path_is_clipped_to_the_soft_bar_cap() {
    let h = harness();
    let out = h
        .service
        .get_history(history_options(TimeFrame::Min1, 30))
        .await
        .unwrap();

    // 30 days of minutes would be 43200 bars; the window is pulled
    // forward to the cap, ending at the last closed bar.
    assert!(out.len() as i64 <= SOFT_BAR_CAP);
    assert!(out.len() as i64 >= SOFT_BAR_CAP - 2);
    assert_ascending_unique(&out);

    let now = chrono::Utc::now().timestamp_millis();
    let last = out.last().unwrap();
    assert!(last.time < frame_start(now, TimeFrame::Min1));
}

#[tokio::test]
async fn fast_path_never_returns_the_open_bar() {
    let h = harness();
    let out = h
        .service
        .get_history(history_options(TimeFrame::H1, 2))
        .await
        .unwrap();
    let now = chrono::Utc::now().timestamp_millis();
    assert!(!out.is_empty());
    assert!(out.iter().all(|c| c.time < frame_start(now, TimeFrame::H1)));
}

#[tokio::test]
async fn week_history_serves_closed_weeks_and_a_live_tail() {
    let h = harness();
    let out = h
        .service
        .get_history(history_options(TimeFrame::Week, 21))
        .await
        .unwrap();

    assert!(!out.is_empty());
    assert_ascending_unique(&out);
    for candle in &out {
        assert_eq!(candle.time, frame_start(candle.time, TimeFrame::Week));
    }

    // The live-tail rebuild splices in the still-forming week.
    let now = chrono::Utc::now().timestamp_millis();
    assert_eq!(out.last().unwrap().time, frame_start(now, TimeFrame::Week));

    // The walk warmed the day cache; yesterday's bucket is persisted,
    // today's must not be.
    let yesterday = round_day(now) - DAY_MS;
    assert!(h.store.bucket(&key(TimeFrame::Day), yesterday).is_some());
    let today_bucket = h.store.bucket(&key(TimeFrame::Day), round_day(now));
    assert!(today_bucket.is_none());
}

#[tokio::test(start_paused = true)]
async fn failing_backfill_retries_then_exhausts() {
    let h = harness();
    h.source.set_fail_all(true);

    let err = h
        .service
        .get_history(history_options(TimeFrame::Week, 7))
        .await
        .unwrap_err();

    match err {
        Error::Candle(CandleError::BackfillExhausted { attempts }) => {
            assert_eq!(attempts, MAX_BACKFILL_ATTEMPTS);
        }
        other => panic!("expected BackfillExhausted, got {other}"),
    }
}

#[tokio::test]
async fn cancelled_backfill_stops_early() {
    let h = harness();
    let (canceller, handle) = cancel_pair();
    canceller.cancel();

    let err = h
        .service
        .create_history(history_options(TimeFrame::Week, 7), Some(handle))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Candle(CandleError::Cancelled)));
    assert_eq!(h.source.fetch_count(), 0);
}

// =============================================================================
// Consumer API
// =============================================================================

#[tokio::test]
async fn get_returns_descending_candles() {
    let h = harness();
    let out = h
        .service
        .get(
            ConnectorKind::Binance,
            MarketKind::Spot,
            "BTCUSDT",
            TimeFrame::Day,
        )
        .await
        .unwrap();

    assert!(!out.is_empty());
    for pair in out.windows(2) {
        assert!(pair[0].time > pair[1].time, "expected descending order");
    }
}

// =============================================================================
// Live tail feed
// =============================================================================

#[tokio::test]
async fn final_candle_in_open_frame_is_silently_dropped() {
    let h = harness();
    let now = chrono::Utc::now().timestamp_millis();

    h.service
        .upsert_final_candle(FinalCandleEvent {
            connector: ConnectorKind::Binance,
            market: MarketKind::Spot,
            symbol: "BTCUSDT".to_string(),
            interval: TimeFrame::H4,
            candle: ProviderCandle {
                symbol: "BTCUSDT".to_string(),
                time: frame_start(now, TimeFrame::H4),
                o: 1.0,
                h: 1.0,
                l: 1.0,
                c: 1.0,
                v: 1.0,
            },
        })
        .await
        .unwrap();

    assert_eq!(h.store.save_count(), 0);
}

#[tokio::test]
async fn final_candle_for_a_closed_day_is_persisted() {
    let h = harness();
    let day = MONDAY + 3 * DAY_MS;
    let bar_time = day + 8 * HOUR;

    h.service
        .upsert_final_candle(FinalCandleEvent {
            connector: ConnectorKind::Binance,
            market: MarketKind::Spot,
            symbol: "BTCUSDT".to_string(),
            interval: TimeFrame::H4,
            candle: ProviderCandle {
                symbol: "BTCUSDT".to_string(),
                time: bar_time,
                o: 5.0,
                h: 6.0,
                l: 4.0,
                c: 5.5,
                v: 7.0,
            },
        })
        .await
        .unwrap();

    let bucket = h.store.bucket(&key(TimeFrame::H4), day).unwrap();
    assert_eq!(bucket.len(), 1);
    assert_eq!(bucket[0].time, bar_time);
    assert_eq!(bucket[0].close, 5.5);
}
