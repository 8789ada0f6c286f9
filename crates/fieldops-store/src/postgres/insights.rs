//! InsightStore implementation for PostgreSQL
//!
//! Deduplication of open insights relies on the partial unique index on
//! `fingerprint WHERE status = 'open'`, so concurrent analysis runs converge
//! on one row per fingerprint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldops_core::error::{FieldopsError, Result};
use fieldops_core::models::{
    BookingId, InsightDraft, InsightFilter, InsightId, InsightStatus, ScheduleInsight, TechnicianId,
};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::{db_err, PostgresStore};
use crate::ports::InsightStore;

const INSIGHT_COLUMNS: &str = "id, kind, severity, title, message, date_key, technician_id, \
     booking_ids, fingerprint, status, source, confidence, resolution_note, created_at, \
     updated_at, resolved_at";

fn row_to_insight(row: PgRow) -> Result<ScheduleInsight> {
    let kind: String = row.try_get("kind").map_err(db_err("Failed to read kind"))?;
    let severity: String = row.try_get("severity").map_err(db_err("Failed to read severity"))?;
    let status: String = row.try_get("status").map_err(db_err("Failed to read status"))?;
    let source: String = row.try_get("source").map_err(db_err("Failed to read source"))?;
    let technician_id: Option<String> =
        row.try_get("technician_id").map_err(db_err("Failed to read technician_id"))?;
    let booking_ids: Vec<String> =
        row.try_get("booking_ids").map_err(db_err("Failed to read booking_ids"))?;

    Ok(ScheduleInsight {
        id: InsightId(row.try_get("id").map_err(db_err("Failed to read id"))?),
        kind: kind.parse()?,
        severity: severity.parse()?,
        title: row.try_get("title").map_err(db_err("Failed to read title"))?,
        message: row.try_get("message").map_err(db_err("Failed to read message"))?,
        date_key: row.try_get("date_key").map_err(db_err("Failed to read date_key"))?,
        technician_id: technician_id.map(TechnicianId),
        booking_ids: booking_ids.into_iter().map(BookingId).collect(),
        fingerprint: row.try_get("fingerprint").map_err(db_err("Failed to read fingerprint"))?,
        status: status.parse()?,
        source: source.parse()?,
        confidence: row.try_get("confidence").map_err(db_err("Failed to read confidence"))?,
        resolution_note: row
            .try_get("resolution_note")
            .map_err(db_err("Failed to read resolution_note"))?,
        created_at: row.try_get("created_at").map_err(db_err("Failed to read created_at"))?,
        updated_at: row.try_get("updated_at").map_err(db_err("Failed to read updated_at"))?,
        resolved_at: row.try_get("resolved_at").map_err(db_err("Failed to read resolved_at"))?,
    })
}

#[async_trait]
impl InsightStore for PostgresStore {
    async fn upsert_open(&self, draft: &InsightDraft, now: DateTime<Utc>) -> Result<ScheduleInsight> {
        let booking_ids: Vec<&str> = draft.booking_ids.iter().map(|b| b.0.as_str()).collect();

        let query = format!(
            r#"
            INSERT INTO schedule_insights
                (id, kind, severity, title, message, date_key, technician_id, booking_ids,
                 fingerprint, status, source, confidence, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'open', $10, $11, $12, $12)
            ON CONFLICT (fingerprint) WHERE status = 'open' DO UPDATE
            SET severity = EXCLUDED.severity,
                title = EXCLUDED.title,
                message = EXCLUDED.message,
                date_key = EXCLUDED.date_key,
                technician_id = EXCLUDED.technician_id,
                booking_ids = EXCLUDED.booking_ids,
                source = EXCLUDED.source,
                confidence = EXCLUDED.confidence,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            INSIGHT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(InsightId::new().0)
            .bind(draft.kind.as_str())
            .bind(draft.severity.as_str())
            .bind(&draft.title)
            .bind(&draft.message)
            .bind(draft.date_key)
            .bind(draft.technician_id.as_ref().map(|t| t.0.as_str()))
            .bind(&booking_ids)
            .bind(&draft.fingerprint)
            .bind(draft.source.as_str())
            .bind(draft.confidence)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to upsert insight"))?;

        row_to_insight(row)
    }

    async fn get(&self, id: InsightId) -> Result<Option<ScheduleInsight>> {
        let query = format!("SELECT {} FROM schedule_insights WHERE id = $1", INSIGHT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to get insight"))?;

        row.map(row_to_insight).transpose()
    }

    async fn list(&self, filter: &InsightFilter) -> Result<Vec<ScheduleInsight>> {
        let has_window = filter.date_from.is_some() || filter.date_to.is_some();
        let query = format!(
            r#"
            SELECT {}
            FROM schedule_insights
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR kind = $2)
              AND ($3::TEXT IS NULL OR technician_id = $3)
              AND (NOT $4 OR date_key IS NOT NULL)
              AND ($5::DATE IS NULL OR date_key >= $5)
              AND ($6::DATE IS NULL OR date_key <= $6)
            ORDER BY created_at DESC, title
            "#,
            INSIGHT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.kind.map(|k| k.as_str()))
            .bind(filter.technician_id.as_ref().map(|t| t.0.as_str()))
            .bind(has_window)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list insights"))?;

        rows.into_iter().map(row_to_insight).collect()
    }

    async fn transition(
        &self,
        id: InsightId,
        status: InsightStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ScheduleInsight> {
        let mut tx = self.pool.begin().await.map_err(db_err("Failed to begin transaction"))?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM schedule_insights WHERE id = $1 FOR UPDATE")
                .bind(id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err("Failed to lock insight"))?;

        let current: InsightStatus = current
            .ok_or_else(|| FieldopsError::InsightNotFound { id: id.to_string() })?
            .parse()?;

        if !current.can_transition_to(status) {
            return Err(FieldopsError::InvalidTransition {
                id: id.to_string(),
                from: current.to_string(),
                to: status.to_string(),
            });
        }

        let query = format!(
            r#"
            UPDATE schedule_insights
            SET status = $2, resolution_note = $3, updated_at = $4, resolved_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            INSIGHT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.0)
            .bind(status.as_str())
            .bind(&note)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("Failed to update insight"))?;

        tx.commit().await.map_err(db_err("Failed to commit transaction"))?;
        row_to_insight(row)
    }

    async fn dismiss_stale(&self, ids: &[InsightId], note: &str, now: DateTime<Utc>) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<uuid::Uuid> = ids.iter().map(|id| id.0).collect();
        let result = sqlx::query(
            r#"
            UPDATE schedule_insights
            SET status = 'dismissed', resolution_note = $2, updated_at = $3, resolved_at = $3
            WHERE id = ANY($1) AND status = 'open'
            "#,
        )
        .bind(&ids)
        .bind(note)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to dismiss stale insights"))?;

        Ok(result.rows_affected() as usize)
    }
}
