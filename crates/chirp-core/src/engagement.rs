use std::sync::Arc;

use chirp_db::{Database, content, graph, is_unique_violation};
use chirp_types::{MediaId, TweetId, UserId};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::{CoreError, CoreResult};
use crate::media_store::{MediaStore, discard_files};
use crate::retry::with_retry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeOutcome {
    Liked,
    AlreadyLiked,
    OwnTweet,
}

/// Tweet lifecycle, media uploads and likes.
#[derive(Clone)]
pub struct EngagementService {
    db: Arc<Database>,
    media: Arc<dyn MediaStore>,
    config: ServiceConfig,
}

impl EngagementService {
    pub fn new(db: Arc<Database>, media: Arc<dyn MediaStore>, config: ServiceConfig) -> Self {
        Self { db, media, config }
    }

    /// Idempotent: liking twice, or liking your own tweet, succeeds without
    /// changing anything.
    pub fn like_tweet(&self, actor: UserId, tweet: TweetId) -> CoreResult<()> {
        let outcome = with_retry(self.config.retry_attempts, "like_tweet", || {
            self.db.write(|conn| {
                let row = content::get_tweet(conn, tweet)?.ok_or(CoreError::TweetNotFound)?;
                if row.author_id == actor {
                    return Ok(LikeOutcome::OwnTweet);
                }
                if content::has_like(conn, actor, tweet)? {
                    return Ok(LikeOutcome::AlreadyLiked);
                }
                match content::insert_like(conn, actor, tweet, Utc::now()) {
                    Ok(_) => {}
                    // Lost a race against another writer for the same pair.
                    Err(e) if is_unique_violation(&e) => return Ok(LikeOutcome::AlreadyLiked),
                    Err(e) => return Err(e.into()),
                }
                content::adjust_like_count(conn, tweet, 1)?;
                Ok(LikeOutcome::Liked)
            })
        })?;

        match outcome {
            LikeOutcome::Liked => info!(user = %actor, tweet = %tweet, "Tweet liked"),
            other => debug!(user = %actor, tweet = %tweet, ?other, "Like ignored"),
        }
        Ok(())
    }

    pub fn unlike_tweet(&self, actor: UserId, tweet: TweetId) -> CoreResult<()> {
        with_retry(self.config.retry_attempts, "unlike_tweet", || {
            self.db.write(|conn| {
                if !content::delete_like(conn, actor, tweet)? {
                    return Err(CoreError::LikeNotFound);
                }
                content::adjust_like_count(conn, tweet, -1)?;
                Ok(())
            })
        })?;

        info!(user = %actor, tweet = %tweet, "Tweet unliked");
        Ok(())
    }

    /// Creates the tweet and attaches previously uploaded media in one
    /// transaction. Repeated media ids are attached once.
    pub fn create_tweet(
        &self,
        actor: UserId,
        text: &str,
        media_ids: &[MediaId],
    ) -> CoreResult<TweetId> {
        self.validate_content(text)?;

        let mut unique_media = Vec::with_capacity(media_ids.len());
        for id in media_ids {
            if !unique_media.contains(id) {
                unique_media.push(*id);
            }
        }

        let id = with_retry(self.config.retry_attempts, "create_tweet", || {
            self.db.write(|conn| {
                if !graph::user_exists(conn, actor)? {
                    return Err(CoreError::UserNotFound);
                }
                for media in &unique_media {
                    if !content::media_available(conn, *media)? {
                        return Err(CoreError::MediaNotFound(*media));
                    }
                }
                let id = content::insert_tweet(conn, actor, text, Utc::now())?;
                for media in &unique_media {
                    content::attach_media(conn, id, *media)?;
                }
                Ok(id)
            })
        })?;

        info!(author = %actor, tweet = %id, media = unique_media.len(), "Tweet created");
        Ok(id)
    }

    /// Deletes the tweet (likes and media links cascade), then removes the
    /// files of media no other tweet uses. Those media are marked discarded
    /// in the same transaction and cannot be attached again. File removal
    /// failures are logged and never undo the deletion.
    pub fn delete_tweet(&self, actor: UserId, tweet: TweetId) -> CoreResult<()> {
        let orphaned = with_retry(self.config.retry_attempts, "delete_tweet", || {
            self.db.write(|conn| {
                let row = content::get_tweet(conn, tweet)?.ok_or(CoreError::TweetNotFound)?;
                if row.author_id != actor {
                    return Err(CoreError::Forbidden);
                }
                let paths = content::discard_exclusive_media(conn, tweet)?;
                content::delete_tweet(conn, tweet)?;
                Ok(paths)
            })
        })?;

        info!(author = %actor, tweet = %tweet, files = orphaned.len(), "Tweet deleted");
        discard_files(self.media.as_ref(), &orphaned);
        Ok(())
    }

    /// Stores the file and records it as media that tweets can reference.
    pub fn upload_media(
        &self,
        filename: &str,
        mime_type: Option<&str>,
        bytes: &[u8],
    ) -> CoreResult<MediaId> {
        if bytes.is_empty() {
            return Err(CoreError::Validation("uploaded file is empty".into()));
        }
        if bytes.len() > self.config.max_media_bytes {
            return Err(CoreError::Validation(format!(
                "uploaded file exceeds {} bytes",
                self.config.max_media_bytes
            )));
        }

        let storage_path = self.media.save(bytes, filename).map_err(CoreError::Media)?;
        let filename = if filename.trim().is_empty() { storage_path.as_str() } else { filename };

        let inserted = with_retry(self.config.retry_attempts, "upload_media", || {
            self.db.write(|conn| {
                content::insert_media(conn, filename, &storage_path, mime_type, Utc::now())
                    .map_err(CoreError::from)
            })
        });

        match inserted {
            Ok(id) => {
                info!(media = %id, path = %storage_path, "Media uploaded");
                Ok(id)
            }
            Err(e) => {
                warn!("Media row insert failed, removing {}: {}", storage_path, e);
                discard_files(self.media.as_ref(), std::slice::from_ref(&storage_path));
                Err(e)
            }
        }
    }

    fn validate_content(&self, text: &str) -> CoreResult<()> {
        if text.trim().is_empty() {
            return Err(CoreError::Validation("tweet content must not be empty".into()));
        }
        let len = text.chars().count();
        if len > self.config.max_tweet_length {
            return Err(CoreError::Validation(format!(
                "tweet content is {} characters, the limit is {}",
                len, self.config.max_tweet_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingStore, services, services_with};

    fn like_count(svc: &crate::Services, tweet: TweetId) -> i64 {
        svc.feed
            .global_feed()
            .unwrap()
            .into_iter()
            .find(|e| e.id == tweet)
            .map(|e| e.like_count)
            .unwrap()
    }

    #[test]
    fn like_counts_track_distinct_likers() {
        let (svc, _) = services();
        let author = svc.accounts.register("author", "k0").unwrap();
        let tweet = svc.engagement.create_tweet(author, "hello", &[]).unwrap();

        let fans: Vec<UserId> = (1..=4)
            .map(|i| svc.accounts.register(&format!("fan{i}"), &format!("k{i}")).unwrap())
            .collect();
        for fan in &fans {
            svc.engagement.like_tweet(*fan, tweet).unwrap();
        }
        assert_eq!(like_count(&svc, tweet), 4);

        svc.engagement.unlike_tweet(fans[0], tweet).unwrap();
        assert_eq!(like_count(&svc, tweet), 3);
    }

    #[test]
    fn like_is_idempotent() {
        let (svc, _) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        let b = svc.accounts.register("b", "kb").unwrap();
        let tweet = svc.engagement.create_tweet(a, "x", &[]).unwrap();

        svc.engagement.like_tweet(b, tweet).unwrap();
        svc.engagement.like_tweet(b, tweet).unwrap();
        assert_eq!(like_count(&svc, tweet), 1);
    }

    #[test]
    fn liking_own_tweet_is_a_no_op() {
        let (svc, _) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        let tweet = svc.engagement.create_tweet(a, "x", &[]).unwrap();

        svc.engagement.like_tweet(a, tweet).unwrap();
        assert_eq!(like_count(&svc, tweet), 0);
    }

    #[test]
    fn like_missing_tweet() {
        let (svc, _) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        assert!(matches!(
            svc.engagement.like_tweet(a, TweetId(42)),
            Err(CoreError::TweetNotFound)
        ));
    }

    #[test]
    fn unlike_without_like() {
        let (svc, _) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        let b = svc.accounts.register("b", "kb").unwrap();
        let tweet = svc.engagement.create_tweet(a, "x", &[]).unwrap();

        assert!(matches!(
            svc.engagement.unlike_tweet(b, tweet),
            Err(CoreError::LikeNotFound)
        ));
        assert_eq!(like_count(&svc, tweet), 0);
    }

    #[test]
    fn content_bounds() {
        let (svc, _) = services();
        let a = svc.accounts.register("a", "ka").unwrap();

        assert!(matches!(
            svc.engagement.create_tweet(a, "   ", &[]),
            Err(CoreError::Validation(_))
        ));
        let long = "é".repeat(281);
        assert!(matches!(
            svc.engagement.create_tweet(a, &long, &[]),
            Err(CoreError::Validation(_))
        ));
        // Counted in characters, not bytes.
        svc.engagement.create_tweet(a, &"é".repeat(280), &[]).unwrap();
    }

    #[test]
    fn unknown_media_aborts_whole_tweet() {
        let (svc, _) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        let m = svc.engagement.upload_media("cat.jpg", Some("image/jpeg"), b"meow").unwrap();

        let err = svc.engagement.create_tweet(a, "pic", &[m, MediaId(999)]).unwrap_err();
        assert!(matches!(err, CoreError::MediaNotFound(MediaId(999))));
        assert!(svc.feed.global_feed().unwrap().is_empty());
    }

    #[test]
    fn duplicate_media_ids_attach_once() {
        let (svc, _) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        let m = svc.engagement.upload_media("cat.jpg", None, b"meow").unwrap();

        svc.engagement.create_tweet(a, "pic", &[m, m]).unwrap();
        let feed = svc.feed.global_feed().unwrap();
        assert_eq!(feed[0].attachments.len(), 1);
    }

    #[test]
    fn non_author_cannot_delete() {
        let (svc, store) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        let b = svc.accounts.register("b", "kb").unwrap();
        let m = svc.engagement.upload_media("cat.jpg", None, b"meow").unwrap();
        let tweet = svc.engagement.create_tweet(a, "mine", &[m]).unwrap();
        svc.engagement.like_tweet(b, tweet).unwrap();

        assert!(matches!(
            svc.engagement.delete_tweet(b, tweet),
            Err(CoreError::Forbidden)
        ));

        let feed = svc.feed.global_feed().unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].like_count, 1);
        assert_eq!(feed[0].likes.len(), 1);
        assert_eq!(feed[0].attachments.len(), 1);
        assert!(store.deleted.lock().unwrap().is_empty());
    }

    #[test]
    fn delete_removes_only_exclusive_media_files() {
        let (svc, store) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        let own = svc.engagement.upload_media("own.png", None, b"1").unwrap();
        let shared = svc.engagement.upload_media("shared.png", None, b"2").unwrap();
        let first = svc.engagement.create_tweet(a, "first", &[own, shared]).unwrap();
        svc.engagement.create_tweet(a, "second", &[shared]).unwrap();

        svc.engagement.delete_tweet(a, first).unwrap();

        let deleted = store.deleted.lock().unwrap().clone();
        assert_eq!(deleted, vec!["0-own.png".to_string()]);
        let feed = svc.feed.global_feed().unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].attachments, vec!["1-shared.png".to_string()]);
    }

    #[test]
    fn media_of_deleted_tweet_cannot_be_reattached() {
        let (svc, store) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        let b = svc.accounts.register("b", "kb").unwrap();
        let m = svc.engagement.upload_media("cat.jpg", None, b"meow").unwrap();
        let tweet = svc.engagement.create_tweet(a, "pic", &[m]).unwrap();

        svc.engagement.delete_tweet(a, tweet).unwrap();
        assert_eq!(store.deleted.lock().unwrap().len(), 1);

        assert!(matches!(
            svc.engagement.create_tweet(b, "reuse", &[m]),
            Err(CoreError::MediaNotFound(id)) if id == m
        ));
        assert!(svc.feed.global_feed().unwrap().is_empty());
    }

    #[test]
    fn media_store_failure_does_not_fail_delete() {
        let store = std::sync::Arc::new(RecordingStore {
            fail_deletes: true,
            ..Default::default()
        });
        let svc = services_with(store, ServiceConfig::default());
        let a = svc.accounts.register("a", "ka").unwrap();
        let m = svc.engagement.upload_media("cat.jpg", None, b"meow").unwrap();
        let tweet = svc.engagement.create_tweet(a, "pic", &[m]).unwrap();

        svc.engagement.delete_tweet(a, tweet).unwrap();
        assert!(svc.feed.global_feed().unwrap().is_empty());
    }

    #[test]
    fn delete_missing_tweet() {
        let (svc, _) = services();
        let a = svc.accounts.register("a", "ka").unwrap();
        assert!(matches!(
            svc.engagement.delete_tweet(a, TweetId(5)),
            Err(CoreError::TweetNotFound)
        ));
    }

    #[test]
    fn upload_validation_and_store_errors() {
        let config = ServiceConfig {
            max_media_bytes: 4,
            ..Default::default()
        };
        let svc = services_with(std::sync::Arc::new(RecordingStore::default()), config.clone());
        assert!(matches!(
            svc.engagement.upload_media("a.bin", None, b""),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            svc.engagement.upload_media("a.bin", None, b"12345"),
            Err(CoreError::Validation(_))
        ));

        let failing = std::sync::Arc::new(RecordingStore {
            fail_saves: true,
            ..Default::default()
        });
        let svc = services_with(failing, config);
        assert!(matches!(
            svc.engagement.upload_media("a.bin", None, b"1"),
            Err(CoreError::Media(_))
        ));
    }
}
