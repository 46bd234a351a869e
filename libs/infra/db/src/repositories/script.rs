// [libs/infra/db/src/repositories/script.rs]
//! Script assignment and version registry persistence (spec component C5).

use crate::client::StoreClient;
use crate::errors::DbError;
use libsql::{params, Row};
use sensor_master_domain_models::{Script, ScriptInput};
use tracing::instrument;
use sha2::{Digest, Sha256};

pub struct ScriptRepository {
    client: StoreClient,
}

impl ScriptRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Supersedes any prior script for this sensor: the previous current
    /// row is demoted before the new one is inserted, in one transaction.
    #[instrument(skip(self, input))]
    pub async fn assign(&self, sensor_id: &str, input: &ScriptInput) -> Result<Script, DbError> {
        let conn = self.client.get_connection()?;
        let tx = conn.transaction().await?;

        tx.execute(
            "UPDATE scripts SET is_current = 0 WHERE sensor_id = ?1 AND is_current = 1",
            params![sensor_id.to_string()],
        )
        .await?;

        tx.execute(
            "INSERT INTO scripts (sensor_id, script_content, script_version, description, is_current)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![
                sensor_id.to_string(),
                input.script_content.clone(),
                input.script_version.clone(),
                input.description.clone(),
            ],
        )
        .await?;

        let id = tx.last_insert_rowid();

        let mut rows = tx
            .query(
                "SELECT id, sensor_id, script_content, script_version, description, uploaded_at
                 FROM scripts WHERE id = ?1",
                params![id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DbError::ScriptNotFound)?;
        let script = map_row_to_script(&row)?;

        tx.commit().await?;
        Ok(script)
    }

    #[instrument(skip(self))]
    pub async fn current_for_device(&self, sensor_id: &str) -> Result<Option<Script>, DbError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT id, sensor_id, script_content, script_version, description, uploaded_at
                 FROM scripts WHERE sensor_id = ?1 AND is_current = 1",
                params![sensor_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_script(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_for_device(&self, sensor_id: &str) -> Result<Vec<Script>, DbError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT id, sensor_id, script_content, script_version, description, uploaded_at
                 FROM scripts WHERE sensor_id = ?1 ORDER BY uploaded_at DESC",
                params![sensor_id.to_string()],
            )
            .await?;

        let mut scripts = Vec::new();
        while let Some(row) = rows.next().await? {
            scripts.push(map_row_to_script(&row)?);
        }
        Ok(scripts)
    }
}

/// Content hash for `FetchScript`'s `content_hash` field. Scripts are plain
/// text, not JSON, so this hashes raw bytes rather than going through the
/// canonical-JSON path used for configs.
pub fn hash_script_content(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)[..16].to_string()
}

fn map_row_to_script(row: &Row) -> Result<Script, DbError> {
    Ok(Script {
        id: row.get(0)?,
        sensor_id: row.get(1)?,
        script_content: row.get(2)?,
        script_version: row.get(3)?,
        description: row.get(4)?,
        uploaded_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable() {
        let a = hash_script_content("print('hello')");
        let b = hash_script_content("print('hello')");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn content_hash_changes_with_content() {
        assert_ne!(
            hash_script_content("version one"),
            hash_script_content("version two")
        );
    }
}
