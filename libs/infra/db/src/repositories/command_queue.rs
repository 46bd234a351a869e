// [libs/infra/db/src/repositories/command_queue.rs]
//! Per-device command queue persistence (spec component C4). `dequeue` is
//! the one place this adapter relies on a transaction to make expiry,
//! selection, and delivery atomic — mirrors the assign/lock patterns used
//! elsewhere in this codebase for optimistic state transitions.

use crate::client::StoreClient;
use crate::errors::DbError;
use chrono::{DateTime, Utc};
use libsql::{params, Row};
use sensor_master_domain_models::{AckResult, CommandQueueEntry, CommandStatus};
use tracing::{debug, info, instrument, warn};

pub struct CommandQueueRepository {
    client: StoreClient,
}

impl CommandQueueRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, command_data))]
    pub async fn enqueue(
        &self,
        sensor_id: &str,
        command_type: &str,
        command_data: &serde_json::Value,
        priority: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<i64, DbError> {
        let conn = self.client.get_connection()?;
        let command_data =
            serde_json::to_string(command_data).map_err(|e| DbError::MappingError(e.to_string()))?;

        conn.execute(
            "INSERT INTO command_queue (sensor_id, command_type, command_data, priority, status, expires_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            params![
                sensor_id.to_string(),
                command_type.to_string(),
                command_data,
                priority,
                expires_at,
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    /// Expires stale entries, selects up to `limit` pending entries in
    /// `(priority, created_at)` order, and marks them delivered — all in one
    /// transaction so a crash mid-dequeue can never deliver without
    /// recording it, or vice versa.
    #[instrument(skip(self))]
    pub async fn dequeue(
        &self,
        sensor_id: &str,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CommandQueueEntry>, DbError> {
        let conn = self.client.get_connection()?;
        let tx = conn.transaction().await?;

        tx.execute(
            "UPDATE command_queue SET status = 'expired'
             WHERE sensor_id = ?1 AND status IN ('pending', 'delivered')
               AND expires_at IS NOT NULL AND expires_at <= ?2",
            params![sensor_id.to_string(), now],
        )
        .await?;

        let mut candidate_ids = Vec::new();
        {
            let mut rows = tx
                .query(
                    "SELECT id FROM command_queue
                     WHERE sensor_id = ?1 AND status = 'pending'
                     ORDER BY priority ASC, created_at ASC LIMIT ?2",
                    params![sensor_id.to_string(), limit],
                )
                .await?;
            while let Some(row) = rows.next().await? {
                candidate_ids.push(row.get::<i64>(0)?);
            }
        }

        let mut delivered = Vec::with_capacity(candidate_ids.len());
        for id in candidate_ids {
            tx.execute(
                "UPDATE command_queue SET status = 'delivered', delivered_at = ?2 WHERE id = ?1",
                params![id, now],
            )
            .await?;

            let mut rows = tx
                .query(
                    "SELECT id, sensor_id, command_type, command_data, priority, status,
                            created_at, delivered_at, completed_at, expires_at, result_message
                     FROM command_queue WHERE id = ?1",
                    params![id],
                )
                .await?;
            let row = rows.next().await?.ok_or(DbError::CommandNotFound)?;
            delivered.push(map_row_to_entry(&row)?);
        }

        tx.commit().await?;
        Ok(delivered)
    }

    /// Re-acking an already-terminal command is a tolerated no-op (a
    /// retried ack from a re-booted device should never be a hard error);
    /// an id this sensor never owned is a genuine `CommandNotFound`.
    #[instrument(skip(self, message))]
    pub async fn acknowledge(
        &self,
        sensor_id: &str,
        command_id: i64,
        result: AckResult,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let conn = self.client.get_connection()?;
        let new_status = match result {
            AckResult::Success => CommandStatus::Completed,
            AckResult::Error => CommandStatus::Failed,
        };

        let affected = conn
            .execute(
                "UPDATE command_queue SET status = ?3, completed_at = ?4, result_message = ?5
                 WHERE id = ?1 AND sensor_id = ?2 AND status = 'delivered'",
                params![
                    command_id,
                    sensor_id.to_string(),
                    new_status.as_str(),
                    now,
                    message.map(|m| m.to_string()),
                ],
            )
            .await?;

        if affected > 0 {
            return Ok(());
        }

        let mut rows = conn
            .query(
                "SELECT status FROM command_queue WHERE id = ?1 AND sensor_id = ?2",
                params![command_id, sensor_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let status_raw: String = row.get(0)?;
                let status = CommandStatus::parse(&status_raw)
                    .ok_or_else(|| DbError::MappingError(format!("unknown command status {}", status_raw)))?;
                if status.is_terminal() {
                    debug!("ack for already-terminal command {} from {} is a no-op", command_id, sensor_id);
                    Ok(())
                } else {
                    warn!("ack for non-delivered command {} from {} rejected", command_id, sensor_id);
                    Err(DbError::CommandNotFound)
                }
            }
            None => {
                warn!("ack for unknown command {} from {} rejected", command_id, sensor_id);
                Err(DbError::CommandNotFound)
            }
        }
    }

    /// Deletes terminal entries older than `retention`. Driven by the
    /// background sweep, not by any client-facing operation.
    #[instrument(skip(self))]
    pub async fn gc(&self, retention: chrono::Duration) -> Result<u64, DbError> {
        let conn = self.client.get_connection()?;
        let cutoff = Utc::now() - retention;

        let affected = conn
            .execute(
                "DELETE FROM command_queue
                 WHERE status IN ('completed', 'failed', 'expired')
                   AND created_at < ?1",
                params![cutoff],
            )
            .await?;

        if affected > 0 {
            info!("command queue gc removed {} terminal entries", affected);
        }
        Ok(affected)
    }

    #[instrument(skip(self))]
    pub async fn list_for_device(&self, sensor_id: &str) -> Result<Vec<CommandQueueEntry>, DbError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT id, sensor_id, command_type, command_data, priority, status,
                        created_at, delivered_at, completed_at, expires_at, result_message
                 FROM command_queue WHERE sensor_id = ?1 ORDER BY priority ASC, created_at ASC",
                params![sensor_id.to_string()],
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(map_row_to_entry(&row)?);
        }
        Ok(entries)
    }

    /// Total pending entries across every device, for the diagnostics
    /// endpoint's fleet-wide backlog figure.
    #[instrument(skip(self))]
    pub async fn count_pending(&self) -> Result<i64, DbError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM command_queue WHERE status = 'pending'", ())
            .await?;
        let row = rows.next().await?.ok_or(DbError::MappingError("count query returned no row".into()))?;
        Ok(row.get(0)?)
    }
}

fn map_row_to_entry(row: &Row) -> Result<CommandQueueEntry, DbError> {
    let command_data_raw: String = row.get(3)?;
    let command_data: serde_json::Value =
        serde_json::from_str(&command_data_raw).map_err(|e| DbError::MappingError(e.to_string()))?;
    let status_raw: String = row.get(5)?;
    let status = CommandStatus::parse(&status_raw)
        .ok_or_else(|| DbError::MappingError(format!("unknown command status {}", status_raw)))?;

    Ok(CommandQueueEntry {
        id: row.get(0)?,
        sensor_id: row.get(1)?,
        command_type: row.get(2)?,
        command_data,
        priority: row.get(4)?,
        status,
        created_at: row.get(6)?,
        delivered_at: row.get(7)?,
        completed_at: row.get(8)?,
        expires_at: row.get(9)?,
        result_message: row.get(10)?,
    })
}
