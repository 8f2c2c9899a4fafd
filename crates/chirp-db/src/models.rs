//! Row shapes produced by the feed batch queries. Plain users and tweets
//! come back as `chirp_types::models` values directly.
use chirp_types::{TweetId, UserId};
use chrono::{DateTime, Utc};

/// A tweet with its author's name joined in.
#[derive(Debug, Clone)]
pub struct FeedTweetRow {
    pub id: TweetId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
}

#[derive(Debug, Clone)]
pub struct AttachmentRow {
    pub tweet_id: TweetId,
    pub storage_path: String,
}

#[derive(Debug, Clone)]
pub struct LikerRow {
    pub tweet_id: TweetId,
    pub user_id: UserId,
    pub name: String,
}
