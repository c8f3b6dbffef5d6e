//! Error types for connector operations.

use thiserror::Error;

/// Errors that can occur while talking to an upstream connector.
///
/// Fetch failures propagate to the engine unrecovered; the history
/// backfill path decides whether to retry with backoff or give up.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// The requested symbol is unknown to the connector.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The connector cannot serve candles at this timeframe.
    #[error("Unsupported interval {interval} for connector {connector}")]
    UnsupportedInterval {
        connector: String,
        interval: String,
    },

    /// The connector rejected the request window.
    #[error("Invalid range [{from}, {to}) requested from {connector}")]
    InvalidRange {
        connector: String,
        from: i64,
        to: i64,
    },

    /// The connector rate limited the request. Retry with backoff.
    #[error("Rate limited: {connector}")]
    RateLimited { connector: String },

    /// Transport-level failure (connection refused, timeout, TLS, ...).
    #[error("Network error from {connector}: {message}")]
    Network { connector: String, message: String },

    /// The connector answered but the payload could not be decoded.
    #[error("Malformed response from {connector}: {message}")]
    MalformedResponse { connector: String, message: String },

    /// A connector-specific error that fits no other variant.
    #[error("Connector error: {connector} - {message}")]
    Upstream { connector: String, message: String },
}
