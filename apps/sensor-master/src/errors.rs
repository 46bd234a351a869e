// [apps/sensor-master/src/errors.rs]
//! Boundary error taxonomy (spec §7). Repository/storage errors are
//! converted into this shape at the handler layer; nothing downstream of
//! here leaks a `DbError` or a raw `libsql::Error` to a caller.

use axum::{http::StatusCode, response::IntoResponse, Json};
use sensor_master_infra_db::DbError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("device not registered")]
    DeviceNotRegistered,

    #[error("command not found")]
    CommandNotFound,

    #[error("storage unavailable")]
    StorageUnavailable,

    #[error("internal error")]
    Internal(String),
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DeviceNotFound => CoreError::DeviceNotRegistered,
            DbError::CommandNotFound | DbError::CommandOwnershipMismatch => CoreError::CommandNotFound,
            DbError::ScriptNotFound => CoreError::Internal("script not found".into()),
            DbError::ConnectionError(_) | DbError::QueryError(_) => CoreError::StorageUnavailable,
            DbError::ConfigurationError(e) | DbError::MappingError(e) => CoreError::Internal(e),
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            CoreError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BadRequest", msg.clone()),
            CoreError::DeviceNotRegistered => (
                StatusCode::CONFLICT,
                "DeviceNotRegistered",
                "device not registered; re-register before retrying".to_string(),
            ),
            CoreError::CommandNotFound => (
                StatusCode::NOT_FOUND,
                "CommandNotFound",
                "command not found for this device".to_string(),
            ),
            CoreError::StorageUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "StorageUnavailable",
                "storage temporarily unavailable, retry".to_string(),
            ),
            CoreError::Internal(msg) => {
                error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal", "internal error".to_string())
            }
        };

        let mut response = (
            status,
            Json(json!({ "error": code, "message": message })),
        )
            .into_response();

        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert("Retry-After", "5".parse().unwrap());
        }

        response
    }
}
