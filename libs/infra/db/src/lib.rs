// [libs/infra/db/src/lib.rs]
//! libSQL-backed persistence adapter for the sensor master control plane.
//!
//! The Store (`StoreClient`) owns the connection; repositories are
//! stateless and constructed fresh per request. Nothing in this crate
//! caches rows across requests — see `sensor_master_domain_models` for the
//! pure, on-read classification functions that replace that pattern.

pub mod client;
pub mod errors;
pub mod hash;
pub mod repositories;
pub mod schema;

pub use client::StoreClient;
pub use errors::DbError;
pub use repositories::{
    command_queue::CommandQueueRepository, config_template::ConfigTemplateRepository,
    device::DeviceRepository, script::ScriptRepository,
};
