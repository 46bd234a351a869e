// [apps/sensor-master/src/services/gc.rs]
//! Command queue retention sweep (spec §4.4 `GC`). Deletes terminal
//! entries older than the configured retention window on a fixed
//! interval; there is no client-facing operation that triggers this.

use crate::state::AppState;
use sensor_master_infra_db::repositories::CommandQueueRepository;
use std::time::Duration as StdDuration;
use tokio::time::interval;
use tracing::{error, info};

pub async fn spawn_command_queue_gc(state: AppState) {
    let interval_secs = state.settings.gc_interval_secs;
    let retention = state.settings.command_retention;

    tokio::spawn(async move {
        let mut ticker = interval(StdDuration::from_secs(interval_secs));
        info!("command queue gc sweep active, interval={}s", interval_secs);

        loop {
            ticker.tick().await;

            let repository = CommandQueueRepository::new(state.database_client.clone());
            match repository.gc(retention).await {
                Ok(removed) if removed > 0 => {
                    info!("gc sweep removed {} terminal command entries", removed);
                }
                Ok(_) => {}
                Err(e) => error!("command queue gc sweep failed: {}", e),
            }
        }
    });
}
