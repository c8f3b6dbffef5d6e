use thiserror::Error;

/// Domain errors raised by the candle engine.
///
/// These correspond to caller mistakes or exhausted recovery paths;
/// they propagate unrecovered. Sequence-continuity issues are never
/// errors, only warnings (see `sequence`).
#[derive(Error, Debug)]
pub enum CandleError {
    /// No data source is registered for the requested connector.
    #[error("Unsupported connector: {0}")]
    UnsupportedConnector(String),

    /// A history request arrived without a day count.
    #[error("History start date not passed, use `days`")]
    MissingDays,

    /// Week/month requests must start on an exact UTC day boundary.
    #[error("Incorrect day request interval, `from` should be start of day, from: {from}")]
    MisalignedDayRange { from: i64 },

    /// The slow backfill path gave up after repeated batch failures.
    #[error("History backfill exhausted after {attempts} attempts")]
    BackfillExhausted { attempts: u32 },

    /// The caller cancelled an in-flight backfill.
    #[error("History backfill cancelled")]
    Cancelled,
}
