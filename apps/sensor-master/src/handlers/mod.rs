// [apps/sensor-master/src/handlers/mod.rs]
//! HTTP adapters. `device` carries the five device-facing endpoints (C6),
//! `admin` the operator CRUD surface (C7), `telemetry` the optional
//! pass-through ingest endpoint (C8).

pub mod admin;
pub mod device;
pub mod telemetry;
