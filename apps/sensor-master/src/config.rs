// [apps/sensor-master/src/config.rs]
//! Runtime configuration, assembled once at startup from the process
//! environment and threaded explicitly through every constructor — no
//! global state.

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub turso_auth_token: Option<String>,
    pub port: u16,
    /// T_online (spec §4.2): a device with no config is `pending` only
    /// within this window of its last check-in.
    pub device_online_threshold: Duration,
    /// T_offline (spec §4.2): past this, a device is `offline` regardless
    /// of config state.
    pub device_offline_threshold: Duration,
    /// T_running (spec §4.5), default 2x the typical polling interval.
    pub script_running_threshold: Duration,
    /// T_recent (spec §4.5).
    pub script_recent_threshold: Duration,
    /// Retention window for terminal command_queue entries (spec §4.4 GC).
    pub command_retention: Duration,
    /// How often the background sweep runs.
    pub gc_interval_secs: u64,
    /// Default check-in interval handed to devices when no config
    /// specifies `polling_interval` (spec §4.6 Register/GetConfig).
    pub default_check_in_interval_secs: i64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            turso_auth_token: std::env::var("TURSO_AUTH_TOKEN").ok(),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            device_online_threshold: Duration::seconds(
                env_i64("DEVICE_ONLINE_THRESHOLD_SECS", 300),
            ),
            device_offline_threshold: Duration::seconds(
                env_i64("DEVICE_OFFLINE_THRESHOLD_SECS", 900),
            ),
            script_running_threshold: Duration::seconds(
                env_i64("SCRIPT_RUNNING_THRESHOLD_SECS", 120),
            ),
            script_recent_threshold: Duration::seconds(
                env_i64("SCRIPT_RECENT_THRESHOLD_SECS", 900),
            ),
            command_retention: Duration::days(env_i64("COMMAND_RETENTION_DAYS", 7)),
            gc_interval_secs: env_i64("COMMAND_GC_INTERVAL_SECS", 3600) as u64,
            default_check_in_interval_secs: env_i64("DEFAULT_CHECK_IN_INTERVAL_SECS", 60),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
