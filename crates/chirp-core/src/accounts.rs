use std::sync::Arc;

use chirp_db::{Database, content, graph, is_unique_violation};
use chirp_types::UserId;
use chirp_types::models::UserProfile;
use chrono::Utc;
use tracing::info;

use crate::config::ServiceConfig;
use crate::error::{CoreError, CoreResult};
use crate::media_store::{MediaStore, discard_files};
use crate::retry::with_retry;

const MAX_NAME_LEN: usize = 150;
const MAX_KEY_LEN: usize = 128;

/// Registration, profiles and account removal.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<Database>,
    media: Arc<dyn MediaStore>,
    config: ServiceConfig,
}

impl AccountService {
    pub fn new(db: Arc<Database>, media: Arc<dyn MediaStore>, config: ServiceConfig) -> Self {
        Self { db, media, config }
    }

    pub fn register(&self, name: &str, credential_key: &str) -> CoreResult<UserId> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::Validation(format!(
                "name must be 1 to {} characters",
                MAX_NAME_LEN
            )));
        }
        // Lookups trim the presented key, so the stored one is trimmed too.
        let credential_key = credential_key.trim();
        if credential_key.is_empty() || credential_key.len() > MAX_KEY_LEN {
            return Err(CoreError::Validation(format!(
                "credential key must be 1 to {} bytes",
                MAX_KEY_LEN
            )));
        }

        let id = with_retry(self.config.retry_attempts, "register", || {
            self.db.write(|conn| {
                match graph::insert_user(conn, name, credential_key, Utc::now()) {
                    Err(e) if is_unique_violation(&e) => Err(CoreError::CredentialTaken),
                    other => Ok(other?),
                }
            })
        })?;

        info!(user = %id, "User registered");
        Ok(id)
    }

    pub fn profile(&self, user: UserId) -> CoreResult<UserProfile> {
        with_retry(self.config.retry_attempts, "profile", || {
            self.db.read(|conn| {
                let row = graph::get_user(conn, user)?.ok_or(CoreError::UserNotFound)?;
                Ok(UserProfile {
                    id: row.id,
                    name: row.name,
                    followers: graph::followers(conn, user)?,
                    following: graph::following(conn, user)?,
                })
            })
        })
    }

    /// Removes the user with their tweets, likes and follow edges. Like
    /// counters of tweets they liked are decremented in the same
    /// transaction; files only their tweets used are removed afterwards.
    pub fn delete_user(&self, user: UserId) -> CoreResult<()> {
        let orphaned = with_retry(self.config.retry_attempts, "delete_user", || {
            self.db.write(|conn| {
                if !graph::user_exists(conn, user)? {
                    return Err(CoreError::UserNotFound);
                }
                let paths = content::discard_exclusive_media_of_author(conn, user)?;
                content::release_likes_of_user(conn, user)?;
                graph::delete_user(conn, user)?;
                Ok(paths)
            })
        })?;

        info!(user = %user, files = orphaned.len(), "User deleted");
        discard_files(self.media.as_ref(), &orphaned);
        Ok(())
    }
}
