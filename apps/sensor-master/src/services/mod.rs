// [apps/sensor-master/src/services/mod.rs]
//! Background daemons. Just the one: the command queue retention sweep.

pub mod gc;

pub use gc::spawn_command_queue_gc;
