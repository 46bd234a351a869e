// [libs/infra/db/src/client.rs]
//! Connection management for the Store (spec component C1). Supports a
//! local file, an in-memory database (tests), or a remote libsql/Turso
//! cluster, selected by inspecting the connection URL.

use crate::errors::DbError;
use crate::schema::apply_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct StoreClient {
    database: Arc<Database>,
    /// Keeps an in-memory database alive across connections; SQLite drops
    /// an anonymous `:memory:` database once its last connection closes.
    _memory_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    #[instrument(skip(auth_token))]
    pub async fn connect(url: &str, auth_token: Option<String>) -> Result<Self, DbError> {
        if url.is_empty() {
            return Err(DbError::ConnectionError("DATABASE_URL is empty".into()));
        }

        info!("opening store connection to [{}]", url);

        let is_remote = url.starts_with("libsql://") || url.starts_with("https://");
        let is_memory = url.contains(":memory:") || url.contains("mode=memory");

        let database = if is_remote {
            let token = auth_token.ok_or_else(|| {
                DbError::ConnectionError("remote store requires an auth token".into())
            })?;
            Builder::new_remote(url.to_string(), token).build().await
        } else {
            Builder::new_local(url).build().await
        }
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let database = Arc::new(database);
        let mut anchor = None;

        if is_memory {
            // Apply the schema on a connection we keep alive for the
            // lifetime of the client, otherwise the in-memory database
            // disappears the moment this bootstrap connection drops.
            let anchor_conn = database
                .connect()
                .map_err(|e| DbError::ConnectionError(e.to_string()))?;
            apply_schema(&anchor_conn)
                .await
                .map_err(|e| DbError::ConnectionError(e.to_string()))?;
            anchor = Some(Arc::new(anchor_conn));
        } else {
            let bootstrap_conn = database
                .connect()
                .map_err(|e| DbError::ConnectionError(e.to_string()))?;
            apply_schema(&bootstrap_conn)
                .await
                .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        }

        Ok(Self {
            database,
            _memory_anchor: anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.database.connect().map_err(|e| {
            error!("connection allocation failed: {}", e);
            DbError::ConnectionError(e.to_string())
        })
    }
}
