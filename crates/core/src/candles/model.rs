//! Domain models for the candle engine.
//!
//! The engine works on one canonical [`Candle`] struct. Upstreams speak
//! the wire form (`ProviderCandle`, short field names); the `From`
//! impls below are the only place the two representations meet.

use serde::{Deserialize, Serialize};

use barvault_connectors::models::{ConnectorKind, MarketKind, ProviderCandle, TimeFrame};

/// A single OHLCV bar.
///
/// `time` is the exact epoch-millisecond start of the bar's bucket for
/// its interval, never an arbitrary timestamp inside the bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub symbol: String,
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<ProviderCandle> for Candle {
    fn from(raw: ProviderCandle) -> Self {
        Candle {
            symbol: raw.symbol,
            time: raw.time,
            open: raw.o,
            high: raw.h,
            low: raw.l,
            close: raw.c,
            volume: raw.v,
        }
    }
}

impl From<Candle> for ProviderCandle {
    fn from(candle: Candle) -> Self {
        ProviderCandle {
            symbol: candle.symbol,
            time: candle.time,
            o: candle.open,
            h: candle.high,
            l: candle.low,
            c: candle.close,
            v: candle.volume,
        }
    }
}

/// Half-open time range `[from, to)` in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    pub fn contains(&self, t: i64) -> bool {
        t >= self.from && t < self.to
    }
}

/// Identity of one cached series: everything but the day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub connector: ConnectorKind,
    pub market: MarketKind,
    pub symbol: String,
    pub interval: TimeFrame,
}

impl SeriesKey {
    pub fn new(
        connector: ConnectorKind,
        market: MarketKind,
        symbol: impl Into<String>,
        interval: TimeFrame,
    ) -> Self {
        Self {
            connector,
            market,
            symbol: symbol.into(),
            interval,
        }
    }

    /// Same series at a different interval; used by the fallback
    /// chains (week/month -> day -> 1m).
    pub fn with_interval(&self, interval: TimeFrame) -> Self {
        Self {
            interval,
            ..self.clone()
        }
    }
}

/// Parameters for a history request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryOptions {
    pub connector: ConnectorKind,
    pub market: MarketKind,
    pub symbols: Vec<String>,
    pub interval: TimeFrame,
    /// Lookback in days; required.
    pub days: Option<i64>,
    /// Shift the window back this many days from now (rounding the
    /// window end down to a day boundary when set).
    #[serde(default)]
    pub gap_days: Option<i64>,
}

/// A finalized bar pushed by the live feed collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalCandleEvent {
    pub connector: ConnectorKind,
    pub market: MarketKind,
    pub symbol: String,
    pub interval: TimeFrame,
    pub candle: ProviderCandle,
}
