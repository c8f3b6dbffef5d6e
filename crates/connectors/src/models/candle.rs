//! Wire-format candle as exchanges emit it.

use serde::{Deserialize, Serialize};

/// A single OHLCV bar in provider wire form.
///
/// Field names follow the upstream payloads (`o`/`h`/`l`/`c`/`v`).
/// `time` is the epoch-millisecond start of the bar's bucket; a
/// conforming connector never returns a timestamp from inside the
/// bucket. The domain layer converts this into its own candle type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCandle {
    pub symbol: String,
    pub time: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}
