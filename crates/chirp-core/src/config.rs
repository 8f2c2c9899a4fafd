/// Whether a user's own tweets show up in their following feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedPolicy {
    pub include_own_tweets: bool,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub feed: FeedPolicy,
    /// Maximum tweet length in characters.
    pub max_tweet_length: usize,
    pub max_media_bytes: usize,
    /// Attempts per operation when SQLite reports busy/locked.
    pub retry_attempts: u32,
}

pub const DEFAULT_MAX_TWEET_LENGTH: usize = 280;
pub const DEFAULT_MAX_MEDIA_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            feed: FeedPolicy::default(),
            max_tweet_length: DEFAULT_MAX_TWEET_LENGTH,
            max_media_bytes: DEFAULT_MAX_MEDIA_BYTES,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}
