//! Shared application state for the HTTP server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use lectern_shared::{Result, ServerConfig, secret_from_env};
use lectern_storage::Storage;

/// Process-wide server state, shared across request handlers.
pub struct AppState {
    pub storage: Storage,
    pub uploads_dir: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

impl AppState {
    /// Build state from config: open storage, resolve the JWT secret, and
    /// ensure the uploads directory exists.
    pub async fn from_config(config: &ServerConfig) -> Result<Arc<Self>> {
        let jwt_secret = secret_from_env(&config.jwt_secret_env)?;

        info!(db_path = %config.db_path, "opening storage");
        let storage = Storage::open(Path::new(&config.db_path)).await?;

        let uploads_dir = PathBuf::from(&config.uploads_dir);
        std::fs::create_dir_all(&uploads_dir)
            .map_err(|e| lectern_shared::LecternError::io(&uploads_dir, e))?;

        Ok(Arc::new(Self {
            storage,
            uploads_dir,
            jwt_secret,
            token_ttl_hours: config.token_ttl_hours,
        }))
    }
}
