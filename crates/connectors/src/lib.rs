//! Barvault Connectors Crate
//!
//! This crate provides the upstream-facing side of barvault: the wire
//! candle model, timeframe/market vocabulary, and the `DataSource`
//! abstraction that exchange connectors implement.
//!
//! # Overview
//!
//! The connectors crate supports:
//! - A provider-agnostic `DataSource` trait for candle fetching
//! - An explicit `ConnectorRegistry` (no global state) for dispatch
//! - Wire-format candles (`ProviderCandle`) as upstreams emit them
//! - A deterministic `ReplaySource` for tests and offline runs
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +--------------------+
//! |   Engine (core)  | --> | ConnectorRegistry  |  (kind -> source)
//! +------------------+     +--------------------+
//!                                   |
//!                                   v
//!                           +----------------+
//!                           |   DataSource   |  (Binance, Alpaca, ...)
//!                           +----------------+
//!                                   |
//!                                   v
//!                           +----------------+
//!                           | ProviderCandle |  (wire OHLCV)
//!                           +----------------+
//! ```
//!
//! Exchange-specific REST/WebSocket clients live outside this crate;
//! they only need to implement [`DataSource`] and register themselves.

pub mod errors;
pub mod models;
pub mod registry;
pub mod source;

pub use errors::ConnectorError;
pub use models::{ConnectorKind, MarketKind, ProviderCandle, TimeFrame};
pub use registry::ConnectorRegistry;
pub use source::{DataSource, ReplaySource};
