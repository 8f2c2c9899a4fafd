use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{TweetId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The `{id, name}` pair used wherever another user is referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub followers: Vec<UserSummary>,
    pub following: Vec<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: TweetId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
}

/// A tweet joined with its author, attachments and likers, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: TweetId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: UserSummary,
    /// Storage paths, in attachment order.
    pub attachments: Vec<String>,
    /// Likers, oldest like first.
    pub likes: Vec<UserSummary>,
    pub like_count: i64,
}
