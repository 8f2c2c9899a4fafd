use std::collections::HashMap;
use std::sync::Arc;

use chirp_db::models::FeedTweetRow;
use chirp_db::{Database, feed, graph};
use chirp_types::models::{FeedEntry, UserSummary};
use chirp_types::{TweetId, UserId};
use rusqlite::Connection;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::{CoreError, CoreResult};
use crate::retry::with_retry;

/// Builds feed entries newest first (`created_at`, then id, descending).
/// Each feed is read from a single snapshot with a fixed number of
/// queries regardless of how many tweets it holds.
#[derive(Clone)]
pub struct FeedAssembler {
    db: Arc<Database>,
    config: ServiceConfig,
}

impl FeedAssembler {
    pub fn new(db: Arc<Database>, config: ServiceConfig) -> Self {
        Self { db, config }
    }

    pub fn global_feed(&self) -> CoreResult<Vec<FeedEntry>> {
        let entries = with_retry(self.config.retry_attempts, "global_feed", || {
            self.db.read(|conn| {
                let tweets = feed::all_tweets(conn)?;
                assemble(conn, tweets)
            })
        })?;
        debug!(entries = entries.len(), "Assembled global feed");
        Ok(entries)
    }

    /// Tweets from accounts `user` follows, plus `user`'s own when the feed
    /// policy says so.
    pub fn feed_for_user(&self, user: UserId) -> CoreResult<Vec<FeedEntry>> {
        let include_own = self.config.feed.include_own_tweets;
        let entries = with_retry(self.config.retry_attempts, "feed_for_user", || {
            self.db.read(|conn| {
                if !graph::user_exists(conn, user)? {
                    return Err(CoreError::UserNotFound);
                }
                let tweets = feed::tweets_followed_by(conn, user, include_own)?;
                assemble(conn, tweets)
            })
        })?;
        debug!(user = %user, entries = entries.len(), "Assembled feed");
        Ok(entries)
    }
}

fn assemble(conn: &Connection, tweets: Vec<FeedTweetRow>) -> CoreResult<Vec<FeedEntry>> {
    let ids: Vec<TweetId> = tweets.iter().map(|t| t.id).collect();

    let mut attachments: HashMap<TweetId, Vec<String>> = HashMap::new();
    for row in feed::attachments_for(conn, &ids)? {
        attachments.entry(row.tweet_id).or_default().push(row.storage_path);
    }

    let mut likers: HashMap<TweetId, Vec<UserSummary>> = HashMap::new();
    for row in feed::likers_for(conn, &ids)? {
        likers.entry(row.tweet_id).or_default().push(UserSummary {
            id: row.user_id,
            name: row.name,
        });
    }

    let entries = tweets
        .into_iter()
        .map(|t| FeedEntry {
            attachments: attachments.remove(&t.id).unwrap_or_default(),
            likes: likers.remove(&t.id).unwrap_or_default(),
            id: t.id,
            content: t.content,
            created_at: t.created_at,
            author: UserSummary {
                id: t.author_id,
                name: t.author_name,
            },
            like_count: t.like_count,
        })
        .collect();

    Ok(entries)
}
