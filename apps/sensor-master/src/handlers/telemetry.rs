// [apps/sensor-master/src/handlers/telemetry.rs]
//! Optional raw telemetry pass-through (spec component C8). The core does
//! not interpret, store, or queue these payloads — each POST is accepted
//! independently and handed off for the operator's own pipeline to pick up.

use crate::errors::CoreError;
use crate::state::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sensor_master_infra_db::repositories::device::DeviceRepository;
use tracing::{debug, instrument};

/// `POST /api/sensor-master/telemetry/{sensor_id}`
///
/// No queue semantics: a dropped or duplicated payload here has no effect
/// on device status, config delivery, or command dequeue. The only check
/// performed is that `sensor_id` is a registered device.
#[instrument(skip(state, payload), fields(sensor_id = %sensor_id))]
pub async fn ingest(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, CoreError> {
    let devices = DeviceRepository::new(state.database_client.clone());
    devices.get(&sensor_id).await?;

    debug!("telemetry payload received from {}: {} bytes", sensor_id, payload.to_string().len());
    Ok(StatusCode::ACCEPTED)
}
