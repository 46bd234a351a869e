// [libs/infra/db/src/repositories/mod.rs]
pub mod command_queue;
pub mod config_template;
pub mod device;
pub mod script;

pub use command_queue::CommandQueueRepository;
pub use config_template::ConfigTemplateRepository;
pub use device::DeviceRepository;
pub use script::{hash_script_content, ScriptRepository};
