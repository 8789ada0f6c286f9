//! TravelCacheStore implementation for PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldops_core::error::{FieldopsError, Result};
use fieldops_core::models::{CacheKey, TimeBucket, TravelCacheEntry, TravelEstimate};
use sqlx::Row;

use super::{db_err, PostgresStore};
use crate::ports::TravelCacheStore;

#[async_trait]
impl TravelCacheStore for PostgresStore {
    async fn find_by_hashes(&self, keys: &[CacheKey]) -> Result<Vec<TravelCacheEntry>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let hashes: Vec<&str> = keys.iter().map(|k| k.0.as_str()).collect();
        let rows = sqlx::query(
            r#"
            SELECT hash, origin_normalized, destination_normalized, weekday, hour_bucket,
                   duration_minutes, distance_km, polyline, notes, created_at, expires_at
            FROM travel_pair_cache
            WHERE hash = ANY($1)
            "#,
        )
        .bind(&hashes)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to query travel cache"))?;

        rows.into_iter()
            .map(|row| {
                let weekday: i16 = row.try_get("weekday").map_err(db_err("Failed to read weekday"))?;
                let hour_bucket: i16 =
                    row.try_get("hour_bucket").map_err(db_err("Failed to read hour_bucket"))?;
                Ok(TravelCacheEntry {
                    key: CacheKey(row.try_get("hash").map_err(db_err("Failed to read hash"))?),
                    origin_normalized: row
                        .try_get("origin_normalized")
                        .map_err(db_err("Failed to read origin_normalized"))?,
                    destination_normalized: row
                        .try_get("destination_normalized")
                        .map_err(db_err("Failed to read destination_normalized"))?,
                    time_bucket: TimeBucket {
                        weekday: u8::try_from(weekday).map_err(|_| {
                            FieldopsError::Storage(format!("weekday out of range: {}", weekday))
                        })?,
                        hour_bucket: u8::try_from(hour_bucket).map_err(|_| {
                            FieldopsError::Storage(format!("hour bucket out of range: {}", hour_bucket))
                        })?,
                    },
                    estimate: TravelEstimate {
                        duration_minutes: row
                            .try_get("duration_minutes")
                            .map_err(db_err("Failed to read duration_minutes"))?,
                        distance_km: row
                            .try_get("distance_km")
                            .map_err(db_err("Failed to read distance_km"))?,
                        polyline: row.try_get("polyline").map_err(db_err("Failed to read polyline"))?,
                        notes: row.try_get("notes").map_err(db_err("Failed to read notes"))?,
                    },
                    created_at: row.try_get("created_at").map_err(db_err("Failed to read created_at"))?,
                    expires_at: row.try_get("expires_at").map_err(db_err("Failed to read expires_at"))?,
                })
            })
            .collect()
    }

    async fn bulk_upsert(&self, entries: &[TravelCacheEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(db_err("Failed to begin transaction"))?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO travel_pair_cache
                    (hash, origin_normalized, destination_normalized, weekday, hour_bucket,
                     duration_minutes, distance_km, polyline, notes, created_at, expires_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (hash) DO UPDATE
                SET duration_minutes = EXCLUDED.duration_minutes,
                    distance_km = EXCLUDED.distance_km,
                    polyline = EXCLUDED.polyline,
                    notes = EXCLUDED.notes,
                    created_at = EXCLUDED.created_at,
                    expires_at = EXCLUDED.expires_at
                "#,
            )
            .bind(&entry.key.0)
            .bind(&entry.origin_normalized)
            .bind(&entry.destination_normalized)
            .bind(i16::from(entry.time_bucket.weekday))
            .bind(i16::from(entry.time_bucket.hour_bucket))
            .bind(entry.estimate.duration_minutes)
            .bind(entry.estimate.distance_km)
            .bind(&entry.estimate.polyline)
            .bind(&entry.estimate.notes)
            .bind(entry.created_at)
            .bind(entry.expires_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to upsert travel cache entry"))?;
        }

        tx.commit().await.map_err(db_err("Failed to commit transaction"))?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let result = sqlx::query("DELETE FROM travel_pair_cache WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to purge travel cache"))?;
        Ok(result.rows_affected() as usize)
    }
}
