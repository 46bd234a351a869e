// [apps/sensor-master/src/state/mod.rs]
//! Shared application state. Holds the Store client and config only —
//! repositories are constructed fresh per request (spec §5: "no in-process
//! caches that could diverge from the Store").

use crate::config::Settings;
use chrono::{DateTime, Utc};
use sensor_master_infra_db::StoreClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub database_client: StoreClient,
    pub settings: Arc<Settings>,
    /// Process start time, used only to report uptime on the diagnostics
    /// endpoint — never read by any device- or config-facing logic.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(database_client: StoreClient, settings: Settings) -> Self {
        Self {
            database_client,
            settings: Arc::new(settings),
            started_at: Utc::now(),
        }
    }
}
