//! Connector vocabulary: connector kinds, market kinds, timeframes.
//!
//! These enums are string-backed because they travel through storage
//! keys and API payloads; `as_str` values are the canonical wire form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string that did not match any variant of a wire enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {what}: {value}")]
pub struct UnknownEnumValue {
    pub what: &'static str,
    pub value: String,
}

// =============================================================================
// ConnectorKind
// =============================================================================

/// Identifies an exchange connector implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Binance,
    Alpaca,
}

impl ConnectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::Binance => "binance",
            ConnectorKind::Alpaca => "alpaca",
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConnectorKind {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binance" => Ok(ConnectorKind::Binance),
            "alpaca" => Ok(ConnectorKind::Alpaca),
            other => Err(UnknownEnumValue {
                what: "connector kind",
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// MarketKind
// =============================================================================

/// The market segment a series belongs to on its exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Spot,
    Futures,
    Margin,
}

impl MarketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Spot => "spot",
            MarketKind::Futures => "futures",
            MarketKind::Margin => "margin",
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MarketKind {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot" => Ok(MarketKind::Spot),
            "futures" => Ok(MarketKind::Futures),
            "margin" => Ok(MarketKind::Margin),
            other => Err(UnknownEnumValue {
                what: "market kind",
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// TimeFrame
// =============================================================================

/// Candle timeframe.
///
/// `Min1` through `Day` are fixed-duration frames; `Week` and `Month`
/// are calendar-aligned (ISO week starting Monday UTC, calendar month
/// starting day 1 UTC) and have no fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    Min1,
    #[serde(rename = "3m")]
    Min3,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "30m")]
    Min30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1w")]
    Week,
    #[serde(rename = "1M")]
    Month,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 11] = [
        TimeFrame::Min1,
        TimeFrame::Min3,
        TimeFrame::Min5,
        TimeFrame::Min15,
        TimeFrame::Min30,
        TimeFrame::H1,
        TimeFrame::H2,
        TimeFrame::H4,
        TimeFrame::Day,
        TimeFrame::Week,
        TimeFrame::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Min1 => "1m",
            TimeFrame::Min3 => "3m",
            TimeFrame::Min5 => "5m",
            TimeFrame::Min15 => "15m",
            TimeFrame::Min30 => "30m",
            TimeFrame::H1 => "1h",
            TimeFrame::H2 => "2h",
            TimeFrame::H4 => "4h",
            TimeFrame::Day => "1d",
            TimeFrame::Week => "1w",
            TimeFrame::Month => "1M",
        }
    }

    /// True for calendar-aligned frames (week/month), which have no
    /// fixed millisecond duration.
    pub fn is_calendar(&self) -> bool {
        matches!(self, TimeFrame::Week | TimeFrame::Month)
    }

    /// Fixed frame duration in milliseconds, or `None` for the
    /// calendar-aligned frames.
    pub fn fixed_duration_ms(&self) -> Option<i64> {
        const MINUTE: i64 = 60_000;
        match self {
            TimeFrame::Min1 => Some(MINUTE),
            TimeFrame::Min3 => Some(3 * MINUTE),
            TimeFrame::Min5 => Some(5 * MINUTE),
            TimeFrame::Min15 => Some(15 * MINUTE),
            TimeFrame::Min30 => Some(30 * MINUTE),
            TimeFrame::H1 => Some(60 * MINUTE),
            TimeFrame::H2 => Some(2 * 60 * MINUTE),
            TimeFrame::H4 => Some(4 * 60 * MINUTE),
            TimeFrame::Day => Some(24 * 60 * MINUTE),
            TimeFrame::Week | TimeFrame::Month => None,
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeFrame::ALL
            .iter()
            .find(|tf| tf.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownEnumValue {
                what: "timeframe",
                value: s.to_string(),
            })
    }
}
