//! # Activity Repository
//!
//! Append-only audit log. Every document save writes its entry through
//! [`record`] inside the save's own transaction; the only later mutation is
//! the conditional `reverted_at` stamp written by the revert engine.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use sunar_core::{ActivityEvent, ActivityLogEntry};
use tracing::debug;

use super::new_id;
use crate::error::DbResult;

/// Database row for `activity_log`.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ActivityRecord {
    id: String,
    event: ActivityEvent,
    entity_id: String,
    description: String,
    timestamp: DateTime<Utc>,
    reverted_at: Option<DateTime<Utc>>,
}

impl From<ActivityRecord> for ActivityLogEntry {
    fn from(record: ActivityRecord) -> Self {
        ActivityLogEntry {
            id: record.id,
            event: record.event,
            entity_id: record.entity_id,
            description: record.description,
            timestamp: record.timestamp,
            reverted_at: record.reverted_at,
        }
    }
}

const SELECT_ACTIVITY: &str = r#"
    SELECT id, event, entity_id, description, timestamp, reverted_at
    FROM activity_log
"#;

/// Appends an audit entry on the caller's connection (usually a transaction).
pub(crate) async fn record(
    conn: &mut SqliteConnection,
    event: ActivityEvent,
    entity_id: &str,
    description: impl Into<String>,
) -> DbResult<ActivityLogEntry> {
    let entry = ActivityLogEntry {
        id: new_id(),
        event,
        entity_id: entity_id.to_string(),
        description: description.into(),
        timestamp: Utc::now(),
        reverted_at: None,
    };

    debug!(id = %entry.id, event = %entry.event, entity_id = %entry.entity_id, "Recording activity");

    sqlx::query(
        r#"
        INSERT INTO activity_log (id, event, entity_id, description, timestamp, reverted_at)
        VALUES (?1, ?2, ?3, ?4, ?5, NULL)
        "#,
    )
    .bind(&entry.id)
    .bind(entry.event)
    .bind(&entry.entity_id)
    .bind(&entry.description)
    .bind(entry.timestamp)
    .execute(&mut *conn)
    .await?;

    Ok(entry)
}

/// Fetches one entry on the caller's connection.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<ActivityLogEntry>> {
    let record: Option<ActivityRecord> =
        sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_ACTIVITY))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(record.map(ActivityLogEntry::from))
}

/// Stamps `reverted_at` if the entry is still active.
///
/// Returns `false` when another revert got there first.
pub(crate) async fn mark_reverted(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE activity_log
        SET reverted_at = ?2
        WHERE id = ?1 AND reverted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Read access to the audit log.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ActivityLogEntry>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Most recent entries first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<ActivityLogEntry>> {
        let records: Vec<ActivityRecord> = sqlx::query_as(&format!(
            "{} ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
            SELECT_ACTIVITY
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(ActivityLogEntry::from).collect())
    }

    /// Every entry about one record, oldest first.
    pub async fn for_entity(&self, entity_id: &str) -> DbResult<Vec<ActivityLogEntry>> {
        let records: Vec<ActivityRecord> = sqlx::query_as(&format!(
            "{} WHERE entity_id = ?1 ORDER BY rowid",
            SELECT_ACTIVITY
        ))
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(ActivityLogEntry::from).collect())
    }
}
