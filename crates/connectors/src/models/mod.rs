//! Wire-level models shared by all connectors.

mod candle;
mod types;

pub use candle::ProviderCandle;
pub use types::{ConnectorKind, MarketKind, TimeFrame, UnknownEnumValue};
