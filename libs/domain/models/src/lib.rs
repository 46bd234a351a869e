// [libs/domain/models/src/lib.rs]
//! Shared domain entities for the sensor master control plane.
//!
//! These types are the single source of truth for the shapes that cross the
//! boundary between the HTTP handlers, the repositories, and the Store. None
//! of them know how they are persisted or transported.

pub mod command;
pub mod config_template;
pub mod device;
pub mod script;

pub use command::{AckResult, CommandQueueEntry, CommandStatus};
pub use config_template::{ConfigTemplate, ConfigTemplateInput, ResolvedConfig};
pub use device::{Device, DeviceDescriptor, DeviceStatus, HeartbeatMetrics};
pub use script::{ExecutionStatus, Script, ScriptInput};
