// [apps/sensor-master/src/handlers/admin.rs]
//! Operator-facing CRUD over the four mutable entities (spec component
//! C7), plus the read-only instances listing and diagnostics endpoint.

use crate::errors::CoreError;
use crate::state::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sensor_master_domain_models::{ConfigTemplateInput, ExecutionStatus, ScriptInput};
use sensor_master_infra_db::repositories::{
    command_queue::CommandQueueRepository, config_template::ConfigTemplateRepository,
    device::DeviceRepository, script::ScriptRepository,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

#[derive(Deserialize)]
pub struct DeviceListQuery {
    pub sensor_type: Option<String>,
    pub name_contains: Option<String>,
}

/// `GET /api/sensor-master/sensors`
#[instrument(skip(state))]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(filter): Query<DeviceListQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let devices = DeviceRepository::new(state.database_client.clone());
    let mut all = devices.list().await?;

    if let Some(sensor_type) = &filter.sensor_type {
        all.retain(|d| d.sensor_type.as_deref() == Some(sensor_type.as_str()));
    }
    if let Some(needle) = &filter.name_contains {
        all.retain(|d| {
            d.sensor_name
                .as_deref()
                .map(|n| n.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false)
        });
    }

    let now = Utc::now();
    let annotated: Vec<_> = all
        .into_iter()
        .map(|d| {
            let status = d.classify_status(
                now,
                !d.last_config_hash_delivered.is_empty(),
                state.settings.device_online_threshold,
                state.settings.device_offline_threshold,
            );
            let execution_status = ExecutionStatus::classify(
                d.last_script_execution,
                now,
                state.settings.script_running_threshold,
                state.settings.script_recent_threshold,
            );
            json!({ "device": d, "status": status.as_str(), "execution_status": execution_status })
        })
        .collect();

    Ok((StatusCode::OK, Json(annotated)))
}

/// `GET /api/sensor-master/sensors/{sensor_id}`
#[instrument(skip(state))]
pub async fn get_device(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let devices = DeviceRepository::new(state.database_client.clone());
    let device = devices.get(&sensor_id).await?;

    let now = Utc::now();
    let status = device.classify_status(
        now,
        !device.last_config_hash_delivered.is_empty(),
        state.settings.device_online_threshold,
        state.settings.device_offline_threshold,
    );
    let execution_status = ExecutionStatus::classify(
        device.last_script_execution,
        now,
        state.settings.script_running_threshold,
        state.settings.script_recent_threshold,
    );

    Ok((
        StatusCode::OK,
        Json(json!({ "device": device, "status": status.as_str(), "execution_status": execution_status })),
    ))
}

/// `DELETE /api/sensor-master/sensors/{sensor_id}` — cascades to the
/// device's commands and scripts in the same transaction.
#[instrument(skip(state))]
pub async fn delete_device(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let conn = state.database_client.get_connection().map_err(CoreError::from)?;
    let tx = conn.transaction().await.map_err(|e| CoreError::Internal(e.to_string()))?;

    tx.execute(
        "DELETE FROM command_queue WHERE sensor_id = ?1",
        libsql::params![sensor_id.clone()],
    )
    .await
    .map_err(|e| CoreError::Internal(e.to_string()))?;

    tx.execute("DELETE FROM scripts WHERE sensor_id = ?1", libsql::params![sensor_id.clone()])
        .await
        .map_err(|e| CoreError::Internal(e.to_string()))?;

    let affected = tx
        .execute("DELETE FROM devices WHERE sensor_id = ?1", libsql::params![sensor_id.clone()])
        .await
        .map_err(|e| CoreError::Internal(e.to_string()))?;

    tx.commit().await.map_err(|e| CoreError::Internal(e.to_string()))?;

    if affected == 0 {
        return Err(CoreError::DeviceNotRegistered);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/sensor-master/configs`
#[instrument(skip(state))]
pub async fn list_configs(State(state): State<AppState>) -> Result<impl IntoResponse, CoreError> {
    let configs = ConfigTemplateRepository::new(state.database_client.clone());
    let all = configs.list().await?;
    Ok((StatusCode::OK, Json(all)))
}

/// `POST /api/sensor-master/configs`
#[instrument(skip(state, input))]
pub async fn create_config(
    State(state): State<AppState>,
    Json(input): Json<ConfigTemplateInput>,
) -> Result<impl IntoResponse, CoreError> {
    let configs = ConfigTemplateRepository::new(state.database_client.clone());
    let created = configs.create(&input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/sensor-master/configs/{id}` — bumps `version`.
#[instrument(skip(state, input))]
pub async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ConfigTemplateInput>,
) -> Result<impl IntoResponse, CoreError> {
    let configs = ConfigTemplateRepository::new(state.database_client.clone());
    let updated = configs.update(id, &input).await?;
    Ok((StatusCode::OK, Json(updated)))
}

/// `DELETE /api/sensor-master/configs/{id}`
#[instrument(skip(state))]
pub async fn delete_config(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CoreError> {
    let configs = ConfigTemplateRepository::new(state.database_client.clone());
    configs.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct EnqueueCommandPayload {
    pub sensor_id: String,
    pub command_type: String,
    #[serde(default)]
    pub command_data: serde_json::Value,
    #[serde(default = "default_command_priority")]
    pub priority: i64,
    pub expires_at: Option<chrono::DateTime<Utc>>,
}

fn default_command_priority() -> i64 {
    100
}

#[derive(Serialize)]
struct EnqueueCommandResponse {
    id: i64,
}

/// `POST /api/sensor-master/commands`
#[instrument(skip(state, payload), fields(sensor_id = %payload.sensor_id))]
pub async fn enqueue_command(
    State(state): State<AppState>,
    Json(payload): Json<EnqueueCommandPayload>,
) -> Result<impl IntoResponse, CoreError> {
    let commands = CommandQueueRepository::new(state.database_client.clone());
    let id = commands
        .enqueue(
            &payload.sensor_id,
            &payload.command_type,
            &payload.command_data,
            payload.priority,
            payload.expires_at,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(EnqueueCommandResponse { id })))
}

/// `GET /api/sensor-master/commands/{sensor_id}`
#[instrument(skip(state))]
pub async fn list_commands_for_device(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let commands = CommandQueueRepository::new(state.database_client.clone());
    let entries = commands.list_for_device(&sensor_id).await?;
    Ok((StatusCode::OK, Json(entries)))
}

/// `POST /api/sensor-master/scripts/{sensor_id}`
#[instrument(skip(state, input), fields(sensor_id = %sensor_id))]
pub async fn assign_script(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
    Json(input): Json<ScriptInput>,
) -> Result<impl IntoResponse, CoreError> {
    let scripts = ScriptRepository::new(state.database_client.clone());
    let assigned = scripts.assign(&sensor_id, &input).await?;
    Ok((StatusCode::CREATED, Json(assigned)))
}

/// `GET /api/sensor-master/scripts/{sensor_id}` — full version history.
#[instrument(skip(state))]
pub async fn list_scripts_for_device(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let scripts = ScriptRepository::new(state.database_client.clone());
    let history = scripts.list_for_device(&sensor_id).await?;
    Ok((StatusCode::OK, Json(history)))
}

/// `GET /api/sensor-master/instances` — the spec treats `master_id` as a
/// display name with no failover semantics; this always answers with the
/// single running instance.
#[instrument(skip(_state))]
pub async fn list_instances(State(_state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!([{ "master_id": 1, "name": "sensor-master" }])),
    )
}

/// `GET /api/sensor-master/diagnostics`
#[instrument(skip(state))]
pub async fn diagnostics(State(state): State<AppState>) -> impl IntoResponse {
    let devices = DeviceRepository::new(state.database_client.clone());
    let device_count = devices.list().await.map(|d| d.len()).unwrap_or(0);

    let commands = CommandQueueRepository::new(state.database_client.clone());
    let pending_command_count = commands.count_pending().await.unwrap_or(0);

    let uptime_seconds = (Utc::now() - state.started_at).num_seconds().max(0);

    (
        StatusCode::OK,
        Json(json!({
            "status": "operational",
            "uptime_seconds": uptime_seconds,
            "device_count": device_count,
            "pending_command_count": pending_command_count,
            "runtime_platform": std::env::consts::OS,
            "cpu_cores_logical": num_cpus::get(),
        })),
    )
}
