use std::sync::Arc;

use chirp_db::{Database, graph};
use chirp_types::UserId;

use crate::error::{CoreError, CoreResult};
use crate::retry::with_retry;

/// Maps a request credential to the user it belongs to.
pub trait Authenticator: Send + Sync {
    /// Fails with [`CoreError::Authentication`] when the credential is
    /// missing, blank, or unknown.
    fn resolve(&self, credential: Option<&str>) -> CoreResult<UserId>;
}

/// Looks the credential up in `users.credential_key`.
#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    db: Arc<Database>,
    retry_attempts: u32,
}

impl ApiKeyAuthenticator {
    pub fn new(db: Arc<Database>, retry_attempts: u32) -> Self {
        Self { db, retry_attempts }
    }
}

impl Authenticator for ApiKeyAuthenticator {
    fn resolve(&self, credential: Option<&str>) -> CoreResult<UserId> {
        let key = match credential.map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Err(CoreError::Authentication),
        };

        let found = with_retry(self.retry_attempts, "authenticate", || {
            self.db.read(|conn| graph::find_user_by_credential(conn, key).map_err(CoreError::from))
        })?;

        found.ok_or(CoreError::Authentication)
    }
}
