//! Deterministic in-memory data source.
//!
//! `ReplaySource` synthesizes a reproducible price path so the engine
//! can run without exchange credentials: integration tests, local
//! development, and demo backfills all use it. It plays the role the
//! manual provider plays for quotes in portfolio tooling.

use async_trait::async_trait;

use crate::errors::ConnectorError;
use crate::models::{ConnectorKind, MarketKind, ProviderCandle, TimeFrame};
use crate::source::DataSource;

/// A synthetic candle source with a deterministic price path.
///
/// Prices follow a slow triangular oscillation around `base_price`
/// derived from the bucket index, so the same request always yields
/// the same bars. Calendar frames (week/month) are refused the way a
/// real exchange refuses arbitrary calendar windows.
pub struct ReplaySource {
    kind: ConnectorKind,
    base_price: f64,
    amplitude: f64,
    /// Bars per requested window are clipped to this many, mimicking
    /// upstream page limits.
    max_bars: usize,
}

impl ReplaySource {
    pub fn new(kind: ConnectorKind, base_price: f64) -> Self {
        Self {
            kind,
            base_price,
            amplitude: base_price * 0.05,
            max_bars: 1_000,
        }
    }

    pub fn with_max_bars(mut self, max_bars: usize) -> Self {
        self.max_bars = max_bars;
        self
    }

    /// Deterministic mid price for a bucket index.
    fn price_at(&self, bucket_index: i64) -> f64 {
        // Triangle wave with period 240 buckets.
        let phase = (bucket_index.rem_euclid(240)) as f64 / 240.0;
        let tri = if phase < 0.5 {
            4.0 * phase - 1.0
        } else {
            3.0 - 4.0 * phase
        };
        self.base_price + self.amplitude * tri
    }

    fn bar(&self, symbol: &str, time: i64, step: i64) -> ProviderCandle {
        let idx = time / step;
        let open = self.price_at(idx);
        let close = self.price_at(idx + 1);
        let high = open.max(close) * 1.001;
        let low = open.min(close) * 0.999;
        ProviderCandle {
            symbol: symbol.to_string(),
            time,
            o: open,
            h: high,
            l: low,
            c: close,
            v: 100.0 + (idx.rem_euclid(17)) as f64,
        }
    }
}

#[async_trait]
impl DataSource for ReplaySource {
    fn kind(&self) -> ConnectorKind {
        self.kind
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
    ) -> Result<Vec<ProviderCandle>, ConnectorError> {
        if to <= from {
            return Err(ConnectorError::InvalidRange {
                connector: self.kind.to_string(),
                from,
                to,
            });
        }
        let Some(step) = interval.fixed_duration_ms() else {
            return Err(ConnectorError::UnsupportedInterval {
                connector: self.kind.to_string(),
                interval: interval.to_string(),
            });
        };

        let mut out = Vec::new();
        let mut t = (from / step) * step;
        if t < from {
            t += step;
        }
        while t < to && out.len() < self.max_bars {
            out.push(self.bar(symbol, t, step));
            t += step;
        }
        Ok(out)
    }
}
