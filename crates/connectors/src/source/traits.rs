//! Data source trait definition.
//!
//! This module defines the `DataSource` trait that all exchange
//! connectors implement. The engine never matches on connector kinds;
//! it resolves a source once through the registry and talks to the
//! trait.

use async_trait::async_trait;

use crate::errors::ConnectorError;
use crate::models::{ConnectorKind, MarketKind, ProviderCandle, TimeFrame};

/// Trait for upstream candle sources.
///
/// Implement this trait to add support for a new exchange connector.
///
/// # Contract
///
/// - Returned bars carry `time` equal to their frame start.
/// - A source may return fewer bars than the window allows (trailing
///   or partially available ranges); that is not an error.
/// - Calendar frames (week/month) are generally *not* servable as
///   arbitrary windows; sources should return an empty vector or
///   `ConnectorError::UnsupportedInterval` and let the engine derive
///   them from day bars.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Which connector this source speaks for.
    fn kind(&self) -> ConnectorKind;

    /// Whether this connector guarantees strictly-stepped bars with no
    /// gaps inside a served window. The engine runs its sequence
    /// diagnostics only for sources that claim this.
    fn strict_sequence(&self) -> bool {
        false
    }

    /// Fetch candles for `symbol` at `interval` over `[from, to)`
    /// epoch milliseconds.
    async fn fetch_candles(
        &self,
        market: MarketKind,
        symbol: &str,
        interval: TimeFrame,
        from: i64,
        to: i64,
    ) -> Result<Vec<ProviderCandle>, ConnectorError>;
}
