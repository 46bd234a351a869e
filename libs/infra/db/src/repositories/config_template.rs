// [libs/infra/db/src/repositories/config_template.rs]
//! Config template CRUD plus the tiered Resolver (spec component C3).

use crate::client::StoreClient;
use crate::errors::DbError;
use crate::hash::hash_config;
use libsql::{params, Row};
use sensor_master_domain_models::{ConfigTemplate, ConfigTemplateInput, ResolvedConfig};
use tracing::{debug, instrument};

pub struct ConfigTemplateRepository {
    client: StoreClient,
}

impl ConfigTemplateRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &ConfigTemplateInput) -> Result<ConfigTemplate, DbError> {
        let conn = self.client.get_connection()?;
        let config_data =
            serde_json::to_string(&input.config_data).map_err(|e| DbError::MappingError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_templates (config_name, sensor_id, sensor_type, config_data, priority, is_active, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
            params![
                input.config_name.clone(),
                input.sensor_id.clone(),
                input.sensor_type.clone(),
                config_data,
                input.priority,
                input.is_active as i64,
            ],
        )
        .await?;

        let id = conn.last_insert_rowid();
        self.get(id).await
    }

    /// Edits a template in place, bumping `version` so existing devices see
    /// `config_changed = true` on their next Resolve.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i64, input: &ConfigTemplateInput) -> Result<ConfigTemplate, DbError> {
        let conn = self.client.get_connection()?;
        let config_data =
            serde_json::to_string(&input.config_data).map_err(|e| DbError::MappingError(e.to_string()))?;

        let affected = conn
            .execute(
                "UPDATE config_templates SET
                    config_name = ?2, sensor_id = ?3, sensor_type = ?4, config_data = ?5,
                    priority = ?6, is_active = ?7, version = version + 1, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1",
                params![
                    id,
                    input.config_name.clone(),
                    input.sensor_id.clone(),
                    input.sensor_type.clone(),
                    config_data,
                    input.priority,
                    input.is_active as i64,
                ],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::MappingError(format!("config template {} not found", id)));
        }
        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let conn = self.client.get_connection()?;
        conn.execute("DELETE FROM config_templates WHERE id = ?1", params![id]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<ConfigTemplate, DbError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT id, config_name, sensor_id, sensor_type, config_data, priority,
                        is_active, version, created_at, updated_at
                 FROM config_templates WHERE id = ?1",
                params![id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DbError::MappingError(format!("config template {} not found", id)))?;
        map_row_to_template(&row)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ConfigTemplate>, DbError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT id, config_name, sensor_id, sensor_type, config_data, priority,
                        is_active, version, created_at, updated_at
                 FROM config_templates ORDER BY id ASC",
                (),
            )
            .await?;
        let mut templates = Vec::new();
        while let Some(row) = rows.next().await? {
            templates.push(map_row_to_template(&row)?);
        }
        Ok(templates)
    }

    /// Tiered resolution per spec §4.3: device-specific, then
    /// sensor-type-wide, then global default. Within a tier, lowest
    /// `priority` wins, ties broken by largest `version` then largest `id`.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        sensor_id: &str,
        sensor_type: Option<&str>,
        device_last_hash: &str,
    ) -> Result<ResolvedConfig, DbError> {
        let conn = self.client.get_connection()?;

        const DEVICE_TIER: &str = "SELECT id, config_name, sensor_id, sensor_type, config_data, priority, is_active, version, created_at, updated_at
             FROM config_templates
             WHERE is_active = 1 AND sensor_id = ?1
             ORDER BY priority ASC, version DESC, id DESC LIMIT 1";
        const TYPE_TIER: &str = "SELECT id, config_name, sensor_id, sensor_type, config_data, priority, is_active, version, created_at, updated_at
             FROM config_templates
             WHERE is_active = 1 AND sensor_id IS NULL AND sensor_type = ?1
             ORDER BY priority ASC, version DESC, id DESC LIMIT 1";
        const DEFAULT_TIER: &str = "SELECT id, config_name, sensor_id, sensor_type, config_data, priority, is_active, version, created_at, updated_at
             FROM config_templates
             WHERE is_active = 1 AND sensor_id IS NULL AND sensor_type IS NULL
             ORDER BY priority ASC, version DESC, id DESC LIMIT 1";

        let mut chosen: Option<ConfigTemplate> = None;

        let mut rows = conn.query(DEVICE_TIER, params![sensor_id.to_string()]).await?;
        if let Some(row) = rows.next().await? {
            chosen = Some(map_row_to_template(&row)?);
        }

        if chosen.is_none() {
            if let Some(stype) = sensor_type {
                let mut rows = conn.query(TYPE_TIER, params![stype.to_string()]).await?;
                if let Some(row) = rows.next().await? {
                    chosen = Some(map_row_to_template(&row)?);
                }
            }
        }

        if chosen.is_none() {
            let mut rows = conn.query(DEFAULT_TIER, ()).await?;
            if let Some(row) = rows.next().await? {
                chosen = Some(map_row_to_template(&row)?);
            }
        }

        let Some(template) = chosen else {
            debug!("no config template matched any tier for {}", sensor_id);
            return Ok(ResolvedConfig {
                config_available: false,
                config_changed: false,
                config_hash: String::new(),
                config_name: None,
                config_version: None,
                config: None,
            });
        };

        let config_hash = hash_config(&template.config_data);
        let config_changed = config_hash != device_last_hash;

        Ok(ResolvedConfig {
            config_available: true,
            config_changed,
            config_hash,
            config_name: Some(template.config_name),
            config_version: Some(template.version),
            config: Some(template.config_data),
        })
    }
}

fn map_row_to_template(row: &Row) -> Result<ConfigTemplate, DbError> {
    let config_data_raw: String = row.get(4)?;
    let config_data: serde_json::Value =
        serde_json::from_str(&config_data_raw).map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(ConfigTemplate {
        id: row.get(0)?,
        config_name: row.get(1)?,
        sensor_id: row.get(2)?,
        sensor_type: row.get(3)?,
        config_data,
        priority: row.get(5)?,
        is_active: row.get::<i64>(6)? != 0,
        version: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
