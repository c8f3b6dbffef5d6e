//! SQLite storage implementation for barvault.
//!
//! This crate provides all database-related functionality using Diesel
//! ORM with SQLite. It implements the `CandleStore` trait defined in
//! `barvault-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The day-bucket candle repository
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel
//! dependencies exist. The core engine is database-agnostic and works
//! with traits.
//!
//! ```text
//!      core (engine)
//!           │
//!           ▼
//!   storage-sqlite (this crate)
//!           │
//!           ▼
//!       SQLite DB
//! ```

pub mod candles;
pub mod db;
pub mod errors;
pub mod schema;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool};
pub use db::{spawn_writer, WriteHandle};

// Re-export the repository
pub use candles::CandleRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from barvault-core for convenience
pub use barvault_core::errors::{DatabaseError, Error, Result};
