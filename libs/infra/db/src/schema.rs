// [libs/infra/db/src/schema.rs]
//! Idempotent, code-driven schema application. Runs once per `StoreClient`
//! connection; there is no external migration runner (spec §9 explicitly
//! scopes that out).

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

const BASE_TABLES: &[(&str, &str)] = &[
    (
        "devices",
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            sensor_id TEXT PRIMARY KEY,
            sensor_type TEXT,
            sensor_name TEXT,
            hardware_info TEXT,
            firmware_version TEXT,
            ip_address TEXT,
            mac_address TEXT,
            capabilities TEXT NOT NULL DEFAULT '[]',
            last_check_in DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_config_hash_delivered TEXT NOT NULL DEFAULT '',
            last_script_execution DATETIME,
            last_reported_script_version TEXT,
            last_reported_script_id INTEGER,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#,
    ),
    (
        "config_templates",
        r#"
        CREATE TABLE IF NOT EXISTS config_templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            config_name TEXT NOT NULL,
            sensor_id TEXT,
            sensor_type TEXT,
            config_data TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 100,
            is_active INTEGER NOT NULL DEFAULT 1,
            version INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#,
    ),
    (
        "command_queue",
        r#"
        CREATE TABLE IF NOT EXISTS command_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sensor_id TEXT NOT NULL,
            command_type TEXT NOT NULL,
            command_data TEXT NOT NULL DEFAULT '{}',
            priority INTEGER NOT NULL DEFAULT 100,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            delivered_at DATETIME,
            completed_at DATETIME,
            expires_at DATETIME,
            result_message TEXT
        );
    "#,
    ),
    (
        "scripts",
        r#"
        CREATE TABLE IF NOT EXISTS scripts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sensor_id TEXT NOT NULL,
            script_content TEXT NOT NULL,
            script_version TEXT NOT NULL,
            description TEXT,
            is_current INTEGER NOT NULL DEFAULT 1,
            uploaded_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#,
    ),
];

/// Columns added after the base tables were first shipped. Applied
/// unconditionally; a "duplicate column name" failure just means the
/// column is already there.
const EVOLUTIONARY_COLUMNS: &[(&str, &str)] = &[];

const INDEXES: &[(&str, &str)] = &[
    (
        "idx_config_templates_sensor_id",
        "CREATE INDEX IF NOT EXISTS idx_config_templates_sensor_id ON config_templates(sensor_id, is_active);",
    ),
    (
        "idx_config_templates_sensor_type",
        "CREATE INDEX IF NOT EXISTS idx_config_templates_sensor_type ON config_templates(sensor_type, is_active);",
    ),
    (
        "idx_command_queue_sensor_status",
        "CREATE INDEX IF NOT EXISTS idx_command_queue_sensor_status ON command_queue(sensor_id, status, priority, created_at);",
    ),
    (
        "idx_scripts_sensor_current",
        "CREATE INDEX IF NOT EXISTS idx_scripts_sensor_current ON scripts(sensor_id, is_current);",
    ),
];

#[instrument(skip(conn))]
pub async fn apply_schema(conn: &Connection) -> Result<()> {
    info!("applying store schema");
    create_base_tables(conn).await?;
    apply_evolutionary_columns(conn).await?;
    create_indexes(conn).await?;
    info!("store schema up to date");
    Ok(())
}

async fn create_base_tables(conn: &Connection) -> Result<()> {
    for (name, sql) in BASE_TABLES {
        debug!("creating table: {}", name);
        conn.execute(sql, ())
            .await
            .with_context(|| format!("failed to create table {}", name))?;
    }
    Ok(())
}

async fn apply_evolutionary_columns(conn: &Connection) -> Result<()> {
    for (name, sql) in EVOLUTIONARY_COLUMNS {
        match conn.execute(sql, ()).await {
            Ok(_) => info!("applied evolutionary column: {}", name),
            Err(e) if e.to_string().contains("duplicate column name") => {
                debug!("evolutionary column already present: {}", name);
            }
            Err(e) => warn!("evolutionary column {} failed: {}", name, e),
        }
    }
    Ok(())
}

async fn create_indexes(conn: &Connection) -> Result<()> {
    for (name, sql) in INDEXES {
        debug!("creating index: {}", name);
        conn.execute(sql, ())
            .await
            .with_context(|| format!("failed to create index {}", name))?;
    }
    Ok(())
}
