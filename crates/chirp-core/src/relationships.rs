use std::sync::Arc;

use chirp_db::{Database, graph, is_unique_violation};
use chirp_types::UserId;
use chirp_types::models::UserSummary;
use chrono::Utc;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{CoreError, CoreResult};
use crate::retry::with_retry;

/// Follow/unfollow and follower listings.
#[derive(Clone)]
pub struct RelationshipService {
    db: Arc<Database>,
    config: ServiceConfig,
}

impl RelationshipService {
    pub fn new(db: Arc<Database>, config: ServiceConfig) -> Self {
        Self { db, config }
    }

    pub fn follow(&self, actor: UserId, target: UserId) -> CoreResult<()> {
        if actor == target {
            return Err(CoreError::SelfFollow);
        }

        with_retry(self.config.retry_attempts, "follow", || {
            self.db.write(|conn| {
                if !graph::user_exists(conn, actor)? || !graph::user_exists(conn, target)? {
                    return Err(CoreError::UserNotFound);
                }
                if graph::is_following(conn, actor, target)? {
                    return Err(CoreError::AlreadyFollowing);
                }
                match graph::insert_follow(conn, actor, target, Utc::now()) {
                    Err(e) if is_unique_violation(&e) => Err(CoreError::AlreadyFollowing),
                    other => Ok(other?),
                }
            })
        })?;

        info!(follower = %actor, following = %target, "Follow created");
        Ok(())
    }

    pub fn unfollow(&self, actor: UserId, target: UserId) -> CoreResult<()> {
        let removed = with_retry(self.config.retry_attempts, "unfollow", || {
            self.db
                .write(|conn| graph::delete_follow(conn, actor, target).map_err(CoreError::from))
        })?;

        if !removed {
            return Err(CoreError::NotFollowing);
        }
        info!(follower = %actor, following = %target, "Follow removed");
        Ok(())
    }

    /// Users following `user`.
    pub fn list_followers(&self, user: UserId) -> CoreResult<Vec<UserSummary>> {
        debug!(user = %user, "Listing followers");
        self.list(user, graph::followers)
    }

    /// Users `user` follows.
    pub fn list_following(&self, user: UserId) -> CoreResult<Vec<UserSummary>> {
        debug!(user = %user, "Listing following");
        self.list(user, graph::following)
    }

    fn list(
        &self,
        user: UserId,
        query: fn(&rusqlite::Connection, UserId) -> rusqlite::Result<Vec<UserSummary>>,
    ) -> CoreResult<Vec<UserSummary>> {
        with_retry(self.config.retry_attempts, "list_relationships", || {
            self.db.read(|conn| {
                if !graph::user_exists(conn, user)? {
                    return Err(CoreError::UserNotFound);
                }
                Ok(query(conn, user)?)
            })
        })
    }
}
