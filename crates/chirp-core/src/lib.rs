//! Social graph and feed core: follow/unfollow, likes, tweet lifecycle and
//! feed assembly over a [`chirp_db::Database`]. Callers hand in an already
//! resolved [`UserId`](chirp_types::UserId); credentials are only ever seen
//! by an [`Authenticator`].

pub mod accounts;
pub mod auth;
pub mod config;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod media_store;
pub mod relationships;
mod retry;

use std::sync::Arc;

use chirp_db::Database;

pub use accounts::AccountService;
pub use auth::{ApiKeyAuthenticator, Authenticator};
pub use config::{FeedPolicy, ServiceConfig};
pub use engagement::EngagementService;
pub use error::{CoreError, CoreResult};
pub use feed::FeedAssembler;
pub use media_store::{FsMediaStore, MediaStore};
pub use relationships::RelationshipService;

/// Every service, wired to one storage handle and one media store.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub relationships: RelationshipService,
    pub engagement: EngagementService,
    pub feed: FeedAssembler,
    pub auth: ApiKeyAuthenticator,
}

impl Services {
    pub fn new(db: Arc<Database>, media: Arc<dyn MediaStore>, config: ServiceConfig) -> Self {
        Self {
            accounts: AccountService::new(db.clone(), media.clone(), config.clone()),
            relationships: RelationshipService::new(db.clone(), config.clone()),
            engagement: EngagementService::new(db.clone(), media, config.clone()),
            feed: FeedAssembler::new(db.clone(), config.clone()),
            auth: ApiKeyAuthenticator::new(db, config.retry_attempts),
        }
    }
}
