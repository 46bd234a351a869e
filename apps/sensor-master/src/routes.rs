// [apps/sensor-master/src/routes.rs]
//! HTTP topology: device protocol surface, operator admin surface, and the
//! optional telemetry pass-through, all under `/api/sensor-master`.

use crate::handlers::{admin, device, telemetry};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_router(application_shared_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // Device protocol surface (spec component C6). No auth middleware: the
    // protocol admits adding bearer credentials later without changing
    // these routes (spec §1 Non-goals).
    let device_routes = Router::new()
        .route("/register", post(device::register))
        .route("/config/:sensor_id", get(device::get_config))
        .route("/heartbeat", post(device::heartbeat))
        .route("/script/:sensor_id", get(device::get_script))
        .route("/script-executed", post(device::script_executed))
        .route("/report-version", post(device::report_version));

    // Operator admin surface (spec component C7).
    let admin_routes = Router::new()
        .route("/instances", get(admin::list_instances))
        .route("/diagnostics", get(admin::diagnostics))
        .route("/sensors", get(admin::list_devices))
        .route("/sensors/:sensor_id", get(admin::get_device).delete(admin::delete_device))
        .route("/configs", get(admin::list_configs).post(admin::create_config))
        .route("/configs/:id", put(admin::update_config).delete(admin::delete_config))
        .route("/commands", post(admin::enqueue_command))
        .route("/commands/:sensor_id", get(admin::list_commands_for_device))
        .route(
            "/scripts/:sensor_id",
            post(admin::assign_script).get(admin::list_scripts_for_device),
        );

    // Optional raw ingest pass-through (spec component C8).
    let telemetry_routes = Router::new().route("/telemetry/:sensor_id", post(telemetry::ingest));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest(
            "/api/sensor-master",
            Router::new().merge(device_routes).merge(admin_routes).merge(telemetry_routes),
        )
        .layer(cors)
        .with_state(application_shared_state)
}
