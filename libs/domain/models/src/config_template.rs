// [libs/domain/models/src/config_template.rs]
//! Layered configuration entity (spec component C3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A JSON payload a device (or a class of devices, or every device) should
/// receive. `config_data` is opaque to the core beyond canonicalization and
/// hashing — see `sensor_master_infra_db::hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigTemplate {
    pub id: i64,
    pub config_name: String,
    pub sensor_id: Option<String>,
    pub sensor_type: Option<String>,
    pub config_data: serde_json::Value,
    pub priority: i64,
    pub is_active: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Operator-supplied fields for creating or editing a template. `version` is
/// assigned by the repository; it is never accepted from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigTemplateInput {
    pub config_name: String,
    pub sensor_id: Option<String>,
    pub sensor_type: Option<String>,
    pub config_data: serde_json::Value,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_priority() -> i64 {
    100
}

fn default_true() -> bool {
    true
}

/// Result of `Resolve` (spec §4.3). `config_hash` is always 16 lowercase hex
/// characters; empty string means no template matched any tier.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub config_available: bool,
    pub config_changed: bool,
    pub config_hash: String,
    pub config_name: Option<String>,
    pub config_version: Option<i64>,
    pub config: Option<serde_json::Value>,
}
