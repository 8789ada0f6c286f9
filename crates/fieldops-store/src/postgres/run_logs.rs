//! RunLogStore implementation for PostgreSQL

use async_trait::async_trait;
use fieldops_core::error::Result;
use fieldops_core::models::{InsightRunLog, RunTrigger, TechnicianId};
use sqlx::Row;

use super::{db_err, PostgresStore};
use crate::ports::RunLogStore;

#[async_trait]
impl RunLogStore for PostgresStore {
    async fn append(&self, log: &InsightRunLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO insight_run_logs
                (id, trigger, date_from, date_to, technician_id, generated_count,
                 dismissed_count, enhanced, duration_ms, started_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(log.id)
        .bind(log.trigger.as_str())
        .bind(log.date_from)
        .bind(log.date_to)
        .bind(log.technician_id.as_ref().map(|t| t.0.as_str()))
        .bind(log.generated_count as i32)
        .bind(log.dismissed_count as i32)
        .bind(log.enhanced)
        .bind(log.duration_ms as i64)
        .bind(log.started_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to append run log"))?;
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<InsightRunLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, trigger, date_from, date_to, technician_id, generated_count,
                   dismissed_count, enhanced, duration_ms, started_at
            FROM insight_run_logs
            ORDER BY started_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list run logs"))?;

        rows.into_iter()
            .map(|row| {
                let trigger: String = row.try_get("trigger").map_err(db_err("Failed to read trigger"))?;
                let technician_id: Option<String> =
                    row.try_get("technician_id").map_err(db_err("Failed to read technician_id"))?;
                let generated: i32 =
                    row.try_get("generated_count").map_err(db_err("Failed to read generated_count"))?;
                let dismissed: i32 =
                    row.try_get("dismissed_count").map_err(db_err("Failed to read dismissed_count"))?;
                let duration_ms: i64 =
                    row.try_get("duration_ms").map_err(db_err("Failed to read duration_ms"))?;

                Ok(InsightRunLog {
                    id: row.try_get("id").map_err(db_err("Failed to read id"))?,
                    trigger: trigger.parse::<RunTrigger>()?,
                    date_from: row.try_get("date_from").map_err(db_err("Failed to read date_from"))?,
                    date_to: row.try_get("date_to").map_err(db_err("Failed to read date_to"))?,
                    technician_id: technician_id.map(TechnicianId),
                    generated_count: generated.max(0) as usize,
                    dismissed_count: dismissed.max(0) as usize,
                    enhanced: row.try_get("enhanced").map_err(db_err("Failed to read enhanced"))?,
                    duration_ms: duration_ms.max(0) as u64,
                    started_at: row.try_get("started_at").map_err(db_err("Failed to read started_at"))?,
                })
            })
            .collect()
    }
}
