// [libs/infra/db/src/errors.rs]
//! Persistence-layer error catalog. These map onto the boundary error
//! taxonomy (spec §7) at the handler layer, not here — this enum only
//! distinguishes storage-failure modes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    ConnectionError(String),

    #[error("invalid database configuration: {0}")]
    ConfigurationError(String),

    #[error("query rejected: {0}")]
    QueryError(#[from] libsql::Error),

    #[error("row mapping failed: {0}")]
    MappingError(String),

    #[error("device not found")]
    DeviceNotFound,

    #[error("command not found")]
    CommandNotFound,

    #[error("command does not belong to the given device")]
    CommandOwnershipMismatch,

    #[error("script not found")]
    ScriptNotFound,
}
