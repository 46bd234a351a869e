// [apps/sensor-master/src/handlers/device.rs]
//! The five device-facing endpoints (spec component C6). Each handler is
//! a single logical transaction combining C2-C5; none of them hold a
//! device's state between calls.

use crate::errors::CoreError;
use crate::state::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sensor_master_domain_models::{AckResult, CommandQueueEntry, DeviceDescriptor, HeartbeatMetrics};
use sensor_master_infra_db::repositories::{
    command_queue::CommandQueueRepository, config_template::ConfigTemplateRepository,
    device::DeviceRepository, script::ScriptRepository,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

const DEQUEUE_LIMIT: i64 = 16;

#[derive(Serialize)]
struct CommandEntryWire {
    id: i64,
    command_type: String,
    command_data: serde_json::Value,
    priority: i64,
    expires_at: Option<chrono::DateTime<Utc>>,
}

impl From<CommandQueueEntry> for CommandEntryWire {
    fn from(entry: CommandQueueEntry) -> Self {
        Self {
            id: entry.id,
            command_type: entry.command_type,
            command_data: entry.command_data,
            priority: entry.priority,
            expires_at: entry.expires_at,
        }
    }
}

#[derive(Serialize)]
struct RegisterResponse {
    status: &'static str,
    assigned_master: String,
    master_id: i64,
    has_config: bool,
    check_in_interval: i64,
    config_endpoint: String,
}

/// `POST /api/sensor-master/register`
#[instrument(skip(state, descriptor), fields(sensor_id = %descriptor.sensor_id))]
pub async fn register(
    State(state): State<AppState>,
    Json(descriptor): Json<DeviceDescriptor>,
) -> Result<impl IntoResponse, CoreError> {
    if descriptor.sensor_id.trim().is_empty() {
        return Err(CoreError::BadRequest("sensor_id must not be empty".into()));
    }

    let devices = DeviceRepository::new(state.database_client.clone());
    devices.upsert(&descriptor).await?;

    let configs = ConfigTemplateRepository::new(state.database_client.clone());
    let resolved = configs
        .resolve(&descriptor.sensor_id, descriptor.sensor_type.as_deref(), "")
        .await?;

    let check_in_interval = resolved
        .config
        .as_ref()
        .and_then(|c| c.get("polling_interval"))
        .and_then(|v| v.as_i64())
        .unwrap_or(state.settings.default_check_in_interval_secs);

    info!("device {} registered", descriptor.sensor_id);

    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            status: "registered",
            assigned_master: "sensor-master".to_string(),
            master_id: 1,
            has_config: resolved.config_available,
            check_in_interval,
            config_endpoint: format!("/api/sensor-master/config/{}", descriptor.sensor_id),
        }),
    ))
}

#[derive(Deserialize)]
pub struct GetConfigQuery {
    #[serde(default)]
    hash: Option<String>,
}

#[derive(Serialize)]
struct GetConfigResponse {
    config_available: bool,
    config_changed: bool,
    config_hash: String,
    config_name: Option<String>,
    config_version: Option<i64>,
    config: Option<serde_json::Value>,
    commands: Vec<CommandEntryWire>,
    check_in_interval: i64,
}

/// `GET /api/sensor-master/config/{sensor_id}?hash=<current_hash>`
#[instrument(skip(state), fields(sensor_id = %sensor_id))]
pub async fn get_config(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
    Query(query): Query<GetConfigQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let devices = DeviceRepository::new(state.database_client.clone());
    let device = devices.get(&sensor_id).await?;

    let configs = ConfigTemplateRepository::new(state.database_client.clone());
    let current_hash = query.hash.unwrap_or_default();
    let resolved = configs
        .resolve(&sensor_id, device.sensor_type.as_deref(), &current_hash)
        .await?;

    let commands_repo = CommandQueueRepository::new(state.database_client.clone());
    let delivered = commands_repo.dequeue(&sensor_id, Utc::now(), DEQUEUE_LIMIT).await?;

    if resolved.config_changed {
        devices
            .record_delivered_config_hash(&sensor_id, &resolved.config_hash)
            .await?;
    }

    let check_in_interval = resolved
        .config
        .as_ref()
        .and_then(|c| c.get("polling_interval"))
        .and_then(|v| v.as_i64())
        .unwrap_or(state.settings.default_check_in_interval_secs);

    Ok((
        StatusCode::OK,
        Json(GetConfigResponse {
            config_available: resolved.config_available,
            config_changed: resolved.config_changed,
            config_hash: resolved.config_hash,
            config_name: resolved.config_name,
            config_version: resolved.config_version,
            config: resolved.config,
            commands: delivered.into_iter().map(Into::into).collect(),
            check_in_interval,
        }),
    ))
}

#[derive(Deserialize)]
pub struct CommandResultPayload {
    pub command_id: i64,
    pub result: AckResult,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct HeartbeatPayload {
    pub sensor_id: String,
    pub status: String,
    pub metrics: HeartbeatMetrics,
    #[serde(default)]
    pub command_results: Vec<CommandResultPayload>,
}

#[derive(Serialize)]
struct HeartbeatResponse {
    acknowledged: bool,
    config_updated: bool,
    commands: Vec<CommandEntryWire>,
}

/// `POST /api/sensor-master/heartbeat`
#[instrument(skip(state, payload), fields(sensor_id = %payload.sensor_id))]
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(payload): Json<HeartbeatPayload>,
) -> Result<impl IntoResponse, CoreError> {
    let devices = DeviceRepository::new(state.database_client.clone());
    let device = devices.get(&payload.sensor_id).await?;
    devices.touch_heartbeat(&payload.sensor_id, None).await?;

    let now = Utc::now();
    let commands_repo = CommandQueueRepository::new(state.database_client.clone());

    // Per-ack failures are isolated: one bad command id never poisons the
    // rest of the batch or the overall 200 response (spec §7).
    for ack in &payload.command_results {
        if let Err(e) = commands_repo
            .acknowledge(&payload.sensor_id, ack.command_id, ack.result, ack.message.as_deref(), now)
            .await
        {
            warn!(
                "heartbeat ack for command {} from {} failed: {}",
                ack.command_id, payload.sensor_id, e
            );
        }
    }

    let configs = ConfigTemplateRepository::new(state.database_client.clone());
    let resolved = configs
        .resolve(
            &payload.sensor_id,
            device.sensor_type.as_deref(),
            &device.last_config_hash_delivered,
        )
        .await?;

    let delivered = commands_repo.dequeue(&payload.sensor_id, now, DEQUEUE_LIMIT).await?;

    Ok((
        StatusCode::OK,
        Json(HeartbeatResponse {
            acknowledged: true,
            config_updated: resolved.config_changed,
            commands: delivered.into_iter().map(Into::into).collect(),
        }),
    ))
}

#[derive(Serialize)]
struct GetScriptResponse {
    script_available: bool,
    script: Option<String>,
    version: Option<String>,
    id: Option<i64>,
    name: Option<String>,
    content_hash: Option<String>,
}

/// `GET /api/sensor-master/script/{sensor_id}`
#[instrument(skip(state), fields(sensor_id = %sensor_id))]
pub async fn get_script(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let scripts = ScriptRepository::new(state.database_client.clone());
    let current = scripts.current_for_device(&sensor_id).await?;

    let response = match current {
        Some(script) => GetScriptResponse {
            script_available: true,
            content_hash: Some(sensor_master_infra_db::repositories::script::hash_script_content(
                &script.script_content,
            )),
            script: Some(script.script_content),
            version: Some(script.script_version),
            id: Some(script.id),
            name: script.description,
        },
        None => GetScriptResponse {
            script_available: false,
            script: None,
            version: None,
            id: None,
            name: None,
            content_hash: None,
        },
    };

    Ok((StatusCode::OK, Json(response)))
}

#[derive(Deserialize)]
pub struct ScriptExecutedPayload {
    pub sensor_id: String,
}

/// `POST /api/sensor-master/script-executed`
#[instrument(skip(state, payload), fields(sensor_id = %payload.sensor_id))]
pub async fn script_executed(
    State(state): State<AppState>,
    Json(payload): Json<ScriptExecutedPayload>,
) -> Result<impl IntoResponse, CoreError> {
    let scripts = ScriptRepository::new(state.database_client.clone());
    let devices = DeviceRepository::new(state.database_client.clone());

    let current = scripts.current_for_device(&payload.sensor_id).await?;
    if let Some(script) = current {
        devices
            .record_script_execution(&payload.sensor_id, script.id, &script.script_version)
            .await?;
    }

    Ok((StatusCode::OK, Json(json!({ "acknowledged": true }))))
}

#[derive(Deserialize)]
pub struct ReportVersionPayload {
    pub sensor_id: String,
    pub script_version: String,
    pub script_id: Option<i64>,
}

/// `POST /api/sensor-master/report-version`
///
/// Version reported by the device is authoritative evidence of what it is
/// executing; this handler never second-guesses it (spec §4.5).
#[instrument(skip(state, payload), fields(sensor_id = %payload.sensor_id))]
pub async fn report_version(
    State(state): State<AppState>,
    Json(payload): Json<ReportVersionPayload>,
) -> Result<impl IntoResponse, CoreError> {
    let devices = DeviceRepository::new(state.database_client.clone());
    let script_id = payload.script_id.unwrap_or(0);
    devices
        .record_script_execution(&payload.sensor_id, script_id, &payload.script_version)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "acknowledged": true }))))
}
