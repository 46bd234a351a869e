// [apps/sensor-master/tests/scenarios.rs]
//! End-to-end scenario tests (spec §8, S1-S6). Each test builds its own
//! in-memory Store and router so no test shares state with another.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sensor_master::config::Settings;
use sensor_master::routes::create_router;
use sensor_master::state::AppState;
use sensor_master_infra_db::StoreClient;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_settings() -> Settings {
    Settings {
        database_url: ":memory:".to_string(),
        turso_auth_token: None,
        port: 0,
        device_online_threshold: chrono::Duration::seconds(300),
        device_offline_threshold: chrono::Duration::seconds(900),
        script_running_threshold: chrono::Duration::seconds(120),
        script_recent_threshold: chrono::Duration::seconds(900),
        command_retention: chrono::Duration::days(7),
        gc_interval_secs: 3600,
        default_check_in_interval_secs: 60,
    }
}

async fn new_app() -> axum::Router {
    let client = StoreClient::connect(":memory:", None).await.unwrap();
    let state = AppState::new(client, test_settings());
    create_router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn s1_first_registration() {
    let app = new_app().await;

    let register = json_request(
        "POST",
        "/api/sensor-master/register",
        json!({ "sensor_id": "esp32_001", "sensor_type": "esp32_fermentation" }),
    );
    let response = app.clone().oneshot(register).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["has_config"], json!(false));
    assert_eq!(body["check_in_interval"], json!(60));

    let get_config = get_request("/api/sensor-master/config/esp32_001");
    let response = app.oneshot(get_config).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["config_available"], json!(false));
    assert_eq!(body["commands"], json!([]));
}

#[tokio::test]
async fn s2_type_wide_config_delivery() {
    let app = new_app().await;

    let register = json_request(
        "POST",
        "/api/sensor-master/register",
        json!({ "sensor_id": "esp32_001", "sensor_type": "esp32_fermentation" }),
    );
    app.clone().oneshot(register).await.unwrap();

    let create_config = json_request(
        "POST",
        "/api/sensor-master/configs",
        json!({
            "config_name": "fermentation-default",
            "sensor_id": null,
            "sensor_type": "esp32_fermentation",
            "config_data": { "polling_interval": 30, "data_endpoint": "http://x/api/data" },
            "priority": 100,
            "is_active": true
        }),
    );
    let response = app.clone().oneshot(create_config).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/api/sensor-master/config/esp32_001"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["config_available"], json!(true));
    assert_eq!(body["config_changed"], json!(true));
    assert_eq!(body["config"]["polling_interval"], json!(30));
    let hash = body["config_hash"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request(&format!("/api/sensor-master/config/esp32_001?hash={}", hash)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["config_changed"], json!(false));
}

#[tokio::test]
async fn s3_override_with_device_specific() {
    let app = new_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/sensor-master/register",
            json!({ "sensor_id": "esp32_001", "sensor_type": "esp32_fermentation" }),
        ))
        .await
        .unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/sensor-master/configs",
            json!({
                "config_name": "fermentation-default",
                "sensor_id": null,
                "sensor_type": "esp32_fermentation",
                "config_data": { "polling_interval": 30, "data_endpoint": "http://x" },
                "priority": 100,
                "is_active": true
            }),
        ))
        .await
        .unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/sensor-master/configs",
            json!({
                "config_name": "esp32_001-override",
                "sensor_id": "esp32_001",
                "sensor_type": null,
                "config_data": { "polling_interval": 10, "data_endpoint": "http://y" },
                "priority": 50,
                "is_active": true
            }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/api/sensor-master/config/esp32_001"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["config_changed"], json!(true));
    assert_eq!(body["config"]["polling_interval"], json!(10));
}

#[tokio::test]
async fn s4_command_delivery_and_ack() {
    let app = new_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/sensor-master/register",
            json!({ "sensor_id": "esp32_001" }),
        ))
        .await
        .unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/sensor-master/commands",
            json!({ "sensor_id": "esp32_001", "command_type": "restart", "priority": 1 }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/sensor-master/commands",
            json!({ "sensor_id": "esp32_001", "command_type": "update_config", "priority": 5 }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/api/sensor-master/config/esp32_001"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let commands = body["commands"].as_array().unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0]["command_type"], json!("restart"));
    let restart_id = commands[0]["id"].as_i64().unwrap();
    let update_config_id = commands[1]["id"].as_i64().unwrap();

    let heartbeat = json_request(
        "POST",
        "/api/sensor-master/heartbeat",
        json!({
            "sensor_id": "esp32_001",
            "status": "ok",
            "metrics": { "uptime": 100, "free_memory": 1000, "wifi_rssi": -40 },
            "command_results": [ { "command_id": restart_id, "result": "success", "message": "restarted" } ]
        }),
    );
    let response = app.clone().oneshot(heartbeat).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/api/sensor-master/commands/esp32_001"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    let restart = entries.iter().find(|e| e["id"] == json!(restart_id)).unwrap();
    assert_eq!(restart["status"], json!("completed"));
    let update_config = entries.iter().find(|e| e["id"] == json!(update_config_id)).unwrap();
    assert_eq!(update_config["status"], json!("delivered"));

    let heartbeat = json_request(
        "POST",
        "/api/sensor-master/heartbeat",
        json!({
            "sensor_id": "esp32_001",
            "status": "ok",
            "metrics": { "uptime": 200, "free_memory": 1000, "wifi_rssi": -40 },
            "command_results": [ { "command_id": update_config_id, "result": "success", "message": null } ]
        }),
    );
    app.clone().oneshot(heartbeat).await.unwrap();

    let response = app
        .oneshot(get_request("/api/sensor-master/commands/esp32_001"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    let update_config = entries.iter().find(|e| e["id"] == json!(update_config_id)).unwrap();
    assert_eq!(update_config["status"], json!("completed"));
}

#[tokio::test]
async fn s5_script_assignment() {
    let app = new_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/sensor-master/register",
            json!({ "sensor_id": "esp32_001" }),
        ))
        .await
        .unwrap();

    let assign = json_request(
        "POST",
        "/api/sensor-master/scripts/esp32_001",
        json!({ "script_content": "print('hi')", "script_version": "1.0.0", "description": null }),
    );
    let response = app.clone().oneshot(assign).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/api/sensor-master/script/esp32_001"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["script_available"], json!(true));
    assert_eq!(body["version"], json!("1.0.0"));

    let report = json_request(
        "POST",
        "/api/sensor-master/report-version",
        json!({ "sensor_id": "esp32_001", "script_version": "1.0.0", "script_id": null }),
    );
    let response = app.clone().oneshot(report).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/api/sensor-master/sensors/esp32_001"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["device"]["last_reported_script_version"], json!("1.0.0"));
    assert_eq!(body["execution_status"], json!("Running"));
}

#[tokio::test]
async fn s6_liveness_transition() {
    // Thresholds set to zero so the test doesn't need to wait minutes for a
    // real offline transition.
    let client = StoreClient::connect(":memory:", None).await.unwrap();
    let mut settings = test_settings();
    settings.device_offline_threshold = chrono::Duration::milliseconds(1);
    settings.device_online_threshold = chrono::Duration::milliseconds(1);
    let state = AppState::new(client, settings);
    let app = create_router(state);

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/sensor-master/register",
            json!({ "sensor_id": "esp32_001" }),
        ))
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/sensor-master/sensors"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    let esp32 = entries
        .iter()
        .find(|e| e["device"]["sensor_id"] == json!("esp32_001"))
        .unwrap();
    assert_eq!(esp32["status"], json!("offline"));

    let heartbeat = json_request(
        "POST",
        "/api/sensor-master/heartbeat",
        json!({
            "sensor_id": "esp32_001",
            "status": "ok",
            "metrics": { "uptime": 1, "free_memory": 1, "wifi_rssi": -1 },
            "command_results": []
        }),
    );
    let response = app.clone().oneshot(heartbeat).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/api/sensor-master/sensors")).await.unwrap();
    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    let esp32 = entries
        .iter()
        .find(|e| e["device"]["sensor_id"] == json!("esp32_001"))
        .unwrap();
    assert_eq!(esp32["status"], json!("online"));
}
