//! BookingStore implementation for PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fieldops_core::error::Result;
use fieldops_core::models::{Booking, BookingId, DueItem, TechnicianId};
use sqlx::Row;

use super::{db_err, PostgresStore};
use crate::ports::BookingStore;

#[async_trait]
impl BookingStore for PostgresStore {
    async fn find_bookings_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        technician: Option<&TechnicianId>,
    ) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT id, technician_ids, start_at, duration_hours,
                   actual_duration_hours, historical_duration_hours, location
            FROM bookings
            WHERE start_at >= $1 AND start_at < $2
              AND ($3::TEXT IS NULL OR $3 = ANY(technician_ids))
            ORDER BY start_at, id
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(technician.map(|t| t.0.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to query bookings"))?;

        rows.into_iter()
            .map(|row| {
                let technician_ids: Vec<String> =
                    row.try_get("technician_ids").map_err(db_err("Failed to read technician_ids"))?;
                Ok(Booking {
                    id: BookingId(row.try_get("id").map_err(db_err("Failed to read id"))?),
                    technician_ids: technician_ids.into_iter().map(TechnicianId).collect(),
                    start: row.try_get("start_at").map_err(db_err("Failed to read start_at"))?,
                    duration_hours: row
                        .try_get("duration_hours")
                        .map_err(db_err("Failed to read duration_hours"))?,
                    actual_duration_hours: row
                        .try_get("actual_duration_hours")
                        .map_err(db_err("Failed to read actual_duration_hours"))?,
                    historical_duration_hours: row
                        .try_get("historical_duration_hours")
                        .map_err(db_err("Failed to read historical_duration_hours"))?,
                    location: row.try_get("location").map_err(db_err("Failed to read location"))?,
                })
            })
            .collect()
    }

    async fn find_due_unscheduled_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DueItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, due_date, location, technician_id
            FROM due_items
            WHERE NOT scheduled AND due_date BETWEEN $1 AND $2
            ORDER BY due_date, id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to query due items"))?;

        rows.into_iter()
            .map(|row| {
                let technician_id: Option<String> =
                    row.try_get("technician_id").map_err(db_err("Failed to read technician_id"))?;
                Ok(DueItem {
                    id: row.try_get("id").map_err(db_err("Failed to read id"))?,
                    title: row.try_get("title").map_err(db_err("Failed to read title"))?,
                    due_date: row.try_get("due_date").map_err(db_err("Failed to read due_date"))?,
                    location: row.try_get("location").map_err(db_err("Failed to read location"))?,
                    technician_id: technician_id.map(TechnicianId),
                })
            })
            .collect()
    }
}
