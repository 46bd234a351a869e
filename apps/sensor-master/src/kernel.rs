// [apps/sensor-master/src/kernel.rs]
//! Composition root. Connects the Store, builds shared state, spawns the
//! background sweep, and serves the HTTP router.

use crate::config::Settings;
use crate::routes::create_router;
use crate::services::spawn_command_queue_gc;
use crate::state::AppState;
use sensor_master_infra_db::StoreClient;
use std::net::{IpAddr, SocketAddr};
use tracing::{error, info, instrument};

pub struct SensorMasterKernel {
    port: u16,
    state: AppState,
}

impl SensorMasterKernel {
    #[instrument(skip(settings))]
    pub async fn ignite(settings: Settings) -> Self {
        let database_client =
            StoreClient::connect(&settings.database_url, settings.turso_auth_token.clone())
                .await
                .expect("database connection failed; ignition aborted");

        let port = settings.port;
        Self {
            port,
            state: AppState::new(database_client, settings),
        }
    }

    pub async fn launch(self) {
        spawn_command_queue_gc(self.state.clone()).await;

        let router = create_router(self.state);
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.port);

        info!("sensor master control plane listening on {}", bind_address);

        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("failed to bind network port");

        if let Err(e) = axum::serve(listener, router).await {
            error!("server failure: {}", e);
            std::process::exit(1);
        }
    }
}
