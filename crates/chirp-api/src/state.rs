use std::sync::Arc;

use chirp_core::{CoreResult, Services};
use tracing::error;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub services: Services,
    /// URL prefix attachments are served under, e.g. `/media`.
    pub media_url_prefix: String,
    pub max_upload_bytes: usize,
}

/// Run a core call off the async runtime; every core operation does
/// blocking SQLite and filesystem work.
pub async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
