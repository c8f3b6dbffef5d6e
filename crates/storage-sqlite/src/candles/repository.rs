use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use super::model::{CandleRowDB, CandleSetDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::candle_rows::dsl as rows_dsl;
use crate::schema::candle_sets::dsl as sets_dsl;
use barvault_core::candles::{round_day, Candle, CandleStore, SeriesKey, TimeRange};
use barvault_core::Result;

/// Day-bucket candle repository backed by SQLite.
///
/// Reads go straight to the pool; every mutation runs on the single
/// writer actor connection so a bucket replace (delete old set + rows,
/// insert new) is one serialized transaction.
pub struct CandleRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CandleRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CandleStore for CandleRepository {
    async fn load_day_chunk(
        &self,
        key: &SeriesKey,
        range: TimeRange,
    ) -> Result<Option<Vec<Candle>>> {
        let mut conn = get_connection(&self.pool)?;
        let day_start = round_day(range.from);

        let set: Option<CandleSetDB> = sets_dsl::candle_sets
            .filter(sets_dsl::connector_type.eq(key.connector.as_str()))
            .filter(sets_dsl::market_type.eq(key.market.as_str()))
            .filter(sets_dsl::symbol.eq(&key.symbol))
            .filter(sets_dsl::interval.eq(key.interval.as_str()))
            .filter(sets_dsl::valid_from.eq(day_start))
            .order(sets_dsl::created_at.desc())
            .select(CandleSetDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;

        let Some(set) = set else {
            return Ok(None);
        };

        let rows: Vec<CandleRowDB> = CandleRowDB::belonging_to(&set)
            .filter(rows_dsl::time.ge(range.from))
            .filter(rows_dsl::time.lt(range.to))
            .order(rows_dsl::time.asc())
            .select(CandleRowDB::as_select())
            .load(&mut conn)
            .into_core()?;

        Ok(Some(
            rows.into_iter()
                .map(|r| r.into_candle(&key.symbol))
                .collect(),
        ))
    }

    async fn save_day_bucket(
        &self,
        key: &SeriesKey,
        day: TimeRange,
        candles: &[Candle],
        replace: bool,
    ) -> Result<()> {
        if candles.is_empty() {
            return Ok(());
        }

        let set = CandleSetDB::new(key, day);
        let rows: Vec<CandleRowDB> = candles
            .iter()
            .map(|c| CandleRowDB::from_candle(c, &set.id))
            .collect();

        let connector = key.connector.as_str();
        let market = key.market.as_str();
        let symbol = key.symbol.clone();
        let interval = key.interval.as_str();
        let day_from = day.from;

        self.writer
            .exec(move |conn| {
                if replace {
                    let old_ids: Vec<String> = sets_dsl::candle_sets
                        .filter(sets_dsl::connector_type.eq(connector))
                        .filter(sets_dsl::market_type.eq(market))
                        .filter(sets_dsl::symbol.eq(&symbol))
                        .filter(sets_dsl::interval.eq(interval))
                        .filter(sets_dsl::valid_from.eq(day_from))
                        .select(sets_dsl::id)
                        .load(conn)
                        .into_core()?;

                    if !old_ids.is_empty() {
                        diesel::delete(
                            rows_dsl::candle_rows.filter(rows_dsl::set_id.eq_any(&old_ids)),
                        )
                        .execute(conn)
                        .into_core()?;
                        diesel::delete(
                            sets_dsl::candle_sets.filter(sets_dsl::id.eq_any(&old_ids)),
                        )
                        .execute(conn)
                        .into_core()?;
                    }
                }

                diesel::insert_into(sets_dsl::candle_sets)
                    .values(&set)
                    .execute(conn)
                    .into_core()?;

                for chunk in rows.chunks(1_000) {
                    diesel::insert_into(rows_dsl::candle_rows)
                        .values(chunk)
                        .execute(conn)
                        .into_core()?;
                }
                Ok(())
            })
            .await
    }
}
