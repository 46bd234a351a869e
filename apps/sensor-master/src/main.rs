// [apps/sensor-master/src/main.rs]
//! Binary entry point: bootstraps the environment, observability, and
//! the Tokio runtime, then hands off to the kernel.

use sensor_master::config::Settings;
use sensor_master::kernel::SensorMasterKernel;

use dotenvy::dotenv;
use sensor_master_heimdall::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("sensor_master");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        info!("sensor master control plane: ignition sequence starting");

        let settings = Settings::from_env();
        let kernel = SensorMasterKernel::ignite(settings).await;

        info!("sensor master control plane: fully operational");
        kernel.launch().await;

        Ok(())
    })
}
