// [libs/infra/db/src/repositories/device.rs]
//! Device registry persistence (spec component C2). Stateless: every
//! request constructs a fresh `DeviceRepository` from a cloneable
//! `StoreClient`. No long-lived in-memory pointers to any device.

use crate::client::StoreClient;
use crate::errors::DbError;
use libsql::{params, Row};
use sensor_master_domain_models::{Device, DeviceDescriptor};
use tracing::{debug, instrument, warn};

pub struct DeviceRepository {
    client: StoreClient,
}

impl DeviceRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Inserts a new device or refreshes its static attributes on repeat
    /// registration (spec: `Register` is idempotent per `sensor_id`).
    #[instrument(skip(self, descriptor))]
    pub async fn upsert(&self, descriptor: &DeviceDescriptor) -> Result<(), DbError> {
        let conn = self.client.get_connection()?;
        let capabilities = serde_json::to_string(&descriptor.capabilities)
            .map_err(|e| DbError::MappingError(e.to_string()))?;

        conn.execute(
            "INSERT INTO devices (
                sensor_id, sensor_type, sensor_name, hardware_info, firmware_version,
                ip_address, mac_address, capabilities, last_check_in, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            ON CONFLICT(sensor_id) DO UPDATE SET
                sensor_type = excluded.sensor_type,
                sensor_name = excluded.sensor_name,
                hardware_info = excluded.hardware_info,
                firmware_version = excluded.firmware_version,
                ip_address = excluded.ip_address,
                mac_address = excluded.mac_address,
                capabilities = excluded.capabilities,
                last_check_in = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP",
            params![
                descriptor.sensor_id.clone(),
                descriptor.sensor_type.clone(),
                descriptor.sensor_name.clone(),
                descriptor.hardware_info.clone(),
                descriptor.firmware_version.clone(),
                descriptor.ip_address.clone(),
                descriptor.mac_address.clone(),
                capabilities,
            ],
        )
        .await?;

        debug!("device {} registered/refreshed", descriptor.sensor_id);
        Ok(())
    }

    /// Bumps `last_check_in` and, when a delivered config hash is given,
    /// records it so the next `Resolve` can compute `config_changed`. Only
    /// a real Heartbeat is a check-in (spec glossary); GetConfig must not
    /// call this, or a device polling config without ever heartbeating
    /// would stay online forever.
    #[instrument(skip(self))]
    pub async fn touch_heartbeat(
        &self,
        sensor_id: &str,
        delivered_config_hash: Option<&str>,
    ) -> Result<(), DbError> {
        let conn = self.client.get_connection()?;

        let affected = if let Some(hash) = delivered_config_hash {
            conn.execute(
                "UPDATE devices SET last_check_in = CURRENT_TIMESTAMP,
                    last_config_hash_delivered = ?2, updated_at = CURRENT_TIMESTAMP
                 WHERE sensor_id = ?1",
                params![sensor_id.to_string(), hash.to_string()],
            )
            .await?
        } else {
            conn.execute(
                "UPDATE devices SET last_check_in = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
                 WHERE sensor_id = ?1",
                params![sensor_id.to_string()],
            )
            .await?
        };

        if affected == 0 {
            warn!("heartbeat for unknown device {}", sensor_id);
            return Err(DbError::DeviceNotFound);
        }
        Ok(())
    }

    /// Records a delivered config hash without touching `last_check_in`.
    /// GetConfig is not a check-in (spec glossary: only Register or
    /// Heartbeat advance it).
    #[instrument(skip(self))]
    pub async fn record_delivered_config_hash(&self, sensor_id: &str, hash: &str) -> Result<(), DbError> {
        let conn = self.client.get_connection()?;
        let affected = conn
            .execute(
                "UPDATE devices SET last_config_hash_delivered = ?2, updated_at = CURRENT_TIMESTAMP
                 WHERE sensor_id = ?1",
                params![sensor_id.to_string(), hash.to_string()],
            )
            .await?;

        if affected == 0 {
            warn!("config delivery recorded for unknown device {}", sensor_id);
            return Err(DbError::DeviceNotFound);
        }
        Ok(())
    }

    /// Records that a device reported running a script version (spec C5).
    #[instrument(skip(self))]
    pub async fn record_script_execution(
        &self,
        sensor_id: &str,
        script_id: i64,
        script_version: &str,
    ) -> Result<(), DbError> {
        let conn = self.client.get_connection()?;
        let affected = conn
            .execute(
                "UPDATE devices SET last_script_execution = CURRENT_TIMESTAMP,
                    last_reported_script_id = ?2, last_reported_script_version = ?3,
                    updated_at = CURRENT_TIMESTAMP
                 WHERE sensor_id = ?1",
                params![sensor_id.to_string(), script_id, script_version.to_string()],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::DeviceNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, sensor_id: &str) -> Result<Device, DbError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT sensor_id, sensor_type, sensor_name, hardware_info, firmware_version,
                        ip_address, mac_address, capabilities, last_check_in,
                        last_config_hash_delivered, last_script_execution,
                        last_reported_script_version, last_reported_script_id
                 FROM devices WHERE sensor_id = ?1",
                params![sensor_id.to_string()],
            )
            .await?;

        let row = rows.next().await?.ok_or(DbError::DeviceNotFound)?;
        map_row_to_device(&row)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Device>, DbError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT sensor_id, sensor_type, sensor_name, hardware_info, firmware_version,
                        ip_address, mac_address, capabilities, last_check_in,
                        last_config_hash_delivered, last_script_execution,
                        last_reported_script_version, last_reported_script_id
                 FROM devices ORDER BY sensor_id ASC",
                (),
            )
            .await?;

        let mut devices = Vec::new();
        while let Some(row) = rows.next().await? {
            devices.push(map_row_to_device(&row)?);
        }
        Ok(devices)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, sensor_id: &str) -> Result<(), DbError> {
        let conn = self.client.get_connection()?;
        let affected = conn
            .execute("DELETE FROM devices WHERE sensor_id = ?1", params![sensor_id.to_string()])
            .await?;
        if affected == 0 {
            return Err(DbError::DeviceNotFound);
        }
        Ok(())
    }
}

fn map_row_to_device(row: &Row) -> Result<Device, DbError> {
    let capabilities_raw: String = row.get(7)?;
    let capabilities: Vec<String> =
        serde_json::from_str(&capabilities_raw).map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(Device {
        sensor_id: row.get(0)?,
        sensor_type: row.get(1)?,
        sensor_name: row.get(2)?,
        hardware_info: row.get(3)?,
        firmware_version: row.get(4)?,
        ip_address: row.get(5)?,
        mac_address: row.get(6)?,
        capabilities,
        last_check_in: row.get(8)?,
        last_config_hash_delivered: row.get(9)?,
        last_script_execution: row.get(10)?,
        last_reported_script_version: row.get(11)?,
        last_reported_script_id: row.get(12)?,
    })
}
