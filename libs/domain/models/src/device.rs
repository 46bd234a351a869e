// [libs/domain/models/src/device.rs]
//! Device identity and liveness entity (spec component C2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Liveness classification, recomputed on every read — never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Pending,
    Offline,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Pending => "pending",
            DeviceStatus::Offline => "offline",
        }
    }
}

/// A registered sensor. The Store owns this row; nothing else holds a
/// long-lived copy of it between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub sensor_id: String,
    pub sensor_type: Option<String>,
    pub sensor_name: Option<String>,
    pub hardware_info: Option<String>,
    pub firmware_version: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub capabilities: Vec<String>,
    pub last_check_in: DateTime<Utc>,
    pub last_config_hash_delivered: String,
    pub last_script_execution: Option<DateTime<Utc>>,
    pub last_reported_script_version: Option<String>,
    pub last_reported_script_id: Option<i64>,
}

impl Device {
    /// Pure classification per spec §4.2. `has_config` is supplied by the
    /// caller (the Resolver has already run in the same transaction); this
    /// function never touches the Store itself.
    pub fn classify_status(
        &self,
        now: DateTime<Utc>,
        has_config: bool,
        t_online: chrono::Duration,
        t_offline: chrono::Duration,
    ) -> DeviceStatus {
        let elapsed = now - self.last_check_in;
        if elapsed > t_offline {
            return DeviceStatus::Offline;
        }
        // Pending only overrides the fresh-checkin window; past T_online but
        // short of T_offline still counts as online (spec leaves this band
        // unnamed, and offline demotion has its own, stricter threshold).
        if elapsed <= t_online && !has_config {
            return DeviceStatus::Pending;
        }
        DeviceStatus::Online
    }
}

/// Inbound descriptor carried by `register` and (minus identity fields) by
/// `heartbeat`'s descriptive update path.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceDescriptor {
    pub sensor_id: String,
    pub sensor_name: Option<String>,
    pub sensor_type: Option<String>,
    pub hardware_info: Option<String>,
    pub firmware_version: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Metrics payload carried by `heartbeat`. Opaque beyond the named fields;
/// unrecognised keys are accepted and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatMetrics {
    pub uptime: Option<i64>,
    pub free_memory: Option<i64>,
    pub wifi_rssi: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_at(last_check_in: DateTime<Utc>) -> Device {
        Device {
            sensor_id: "esp32_001".into(),
            sensor_type: Some("esp32_fermentation".into()),
            sensor_name: None,
            hardware_info: None,
            firmware_version: None,
            ip_address: None,
            mac_address: None,
            capabilities: vec![],
            last_check_in,
            last_config_hash_delivered: String::new(),
            last_script_execution: None,
            last_reported_script_version: None,
            last_reported_script_id: None,
        }
    }

    #[test]
    fn classifies_online_within_threshold() {
        let now = Utc::now();
        let device = device_at(now - chrono::Duration::seconds(30));
        let status = device.classify_status(
            now,
            true,
            chrono::Duration::minutes(5),
            chrono::Duration::minutes(15),
        );
        assert_eq!(status, DeviceStatus::Online);
    }

    #[test]
    fn classifies_pending_when_online_but_no_config() {
        let now = Utc::now();
        let device = device_at(now - chrono::Duration::seconds(30));
        let status = device.classify_status(
            now,
            false,
            chrono::Duration::minutes(5),
            chrono::Duration::minutes(15),
        );
        assert_eq!(status, DeviceStatus::Pending);
    }

    #[test]
    fn classifies_offline_past_threshold() {
        let now = Utc::now();
        let device = device_at(now - chrono::Duration::minutes(20));
        let status = device.classify_status(
            now,
            true,
            chrono::Duration::minutes(5),
            chrono::Duration::minutes(15),
        );
        assert_eq!(status, DeviceStatus::Offline);
    }
}
