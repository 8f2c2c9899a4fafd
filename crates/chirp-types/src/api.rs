use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MediaId, TweetId, UserId};
use crate::models::{FeedEntry, UserProfile};

// -- Generic envelopes --

/// `{"result": true}`, the body of every mutation that returns nothing else.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    pub result: bool,
}

impl ResultResponse {
    pub fn ok() -> Self {
        Self { result: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub result: bool,
    pub error_type: String,
    pub error_message: String,
}

// -- Tweets --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTweetRequest {
    pub tweet_data: String,
    #[serde(default)]
    pub tweet_media_ids: Vec<MediaId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTweetResponse {
    pub result: bool,
    pub tweet_id: TweetId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorView {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeView {
    pub user_id: UserId,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TweetView {
    pub id: TweetId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<String>,
    pub author: AuthorView,
    pub likes: Vec<LikeView>,
    pub like_count: i64,
}

impl TweetView {
    /// Attachments are rendered as URLs below `media_prefix`.
    pub fn from_entry(entry: FeedEntry, media_prefix: &str) -> Self {
        Self {
            id: entry.id,
            content: entry.content,
            created_at: entry.created_at,
            attachments: entry
                .attachments
                .into_iter()
                .map(|path| format!("{}/{}", media_prefix.trim_end_matches('/'), path))
                .collect(),
            author: AuthorView {
                id: entry.author.id,
                name: entry.author.name,
            },
            likes: entry
                .likes
                .into_iter()
                .map(|u| LikeView {
                    user_id: u.id,
                    name: u.name,
                })
                .collect(),
            like_count: entry.like_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub result: bool,
    pub tweets: Vec<TweetView>,
}

// -- Media --

#[derive(Debug, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    pub result: bool,
    pub media_id: MediaId,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub result: bool,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserSummary;

    #[test]
    fn tweet_view_prefixes_attachments_and_renames_likers() {
        let entry = FeedEntry {
            id: TweetId(3),
            content: "hi".into(),
            created_at: Utc::now(),
            author: UserSummary { id: UserId(1), name: "a".into() },
            attachments: vec!["cat.jpg".into()],
            likes: vec![UserSummary { id: UserId(2), name: "b".into() }],
            like_count: 1,
        };

        let view = TweetView::from_entry(entry, "/media/");
        assert_eq!(view.attachments, vec!["/media/cat.jpg".to_string()]);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["likes"][0]["user_id"], 2);
        assert_eq!(json["author"]["id"], 1);
    }

    #[test]
    fn create_tweet_request_media_ids_default_to_empty() {
        let req: CreateTweetRequest = serde_json::from_str(r#"{"tweet_data":"x"}"#).unwrap();
        assert!(req.tweet_media_ids.is_empty());
    }
}
