//! Database models for day-bucketed candle storage.
//!
//! A `candle_sets` row is one day bucket: the series key plus the
//! day-aligned validity range. Its `candle_rows` are owned by the
//! bucket and die with it (FK cascade).

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use barvault_core::candles::{Candle, SeriesKey, TimeRange};

/// Database model for a day bucket.
#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::candle_sets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CandleSetDB {
    pub id: String,
    pub connector_type: String,
    pub market_type: String,
    pub symbol: String,
    pub interval: String,
    pub valid_from: i64,
    pub valid_to: i64,
    pub created_at: NaiveDateTime,
}

impl CandleSetDB {
    pub fn new(key: &SeriesKey, day: TimeRange) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            connector_type: key.connector.as_str().to_string(),
            market_type: key.market.as_str().to_string(),
            symbol: key.symbol.clone(),
            interval: key.interval.as_str().to_string(),
            valid_from: day.from,
            valid_to: day.to,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Database model for one candle row inside a bucket.
#[derive(
    Queryable, Identifiable, Insertable, Selectable, Associations, Debug, Clone,
)]
#[diesel(table_name = crate::schema::candle_rows)]
#[diesel(belongs_to(CandleSetDB, foreign_key = set_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CandleRowDB {
    pub id: String,
    pub set_id: String,
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl CandleRowDB {
    pub fn from_candle(candle: &Candle, set_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            set_id: set_id.to_string(),
            time: candle.time,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }

    pub fn into_candle(self, symbol: &str) -> Candle {
        Candle {
            symbol: symbol.to_string(),
            time: self.time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}
