use thiserror::Error;

use crate::candles::CandleError;
use barvault_connectors::errors::ConnectorError;
use barvault_connectors::models::UnknownEnumValue;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the barvault application.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Candle engine error: {0}")]
    Candle(#[from] CandleError),

    #[error("Connector operation failed: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] UnknownEnumValue),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic persistence errors.
///
/// The storage crate maps its backend-specific failures into these
/// variants at the boundary, keeping this crate free of Diesel types.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Internal storage error: {0}")]
    Internal(String),
}
