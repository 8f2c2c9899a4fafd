//! Tweets, media, their associations, and likes.

use chirp_types::models::Tweet;
use chirp_types::{LikeId, MediaId, TweetId, UserId};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result};

// -- Tweets --

pub fn insert_tweet(
    conn: &Connection,
    author: UserId,
    content: &str,
    created_at: DateTime<Utc>,
) -> Result<TweetId> {
    conn.execute(
        "INSERT INTO tweets (author_id, content, created_at) VALUES (?1, ?2, ?3)",
        (author.0, content, created_at),
    )?;
    Ok(TweetId(conn.last_insert_rowid()))
}

pub fn get_tweet(conn: &Connection, id: TweetId) -> Result<Option<Tweet>> {
    conn.query_row(
        "SELECT id, author_id, content, created_at, like_count FROM tweets WHERE id = ?1",
        [id.0],
        |row| {
            Ok(Tweet {
                id: TweetId(row.get(0)?),
                author_id: UserId(row.get(1)?),
                content: row.get(2)?,
                created_at: row.get(3)?,
                like_count: row.get(4)?,
            })
        },
    )
    .optional()
}

/// Likes and media associations cascade; media rows stay.
pub fn delete_tweet(conn: &Connection, id: TweetId) -> Result<bool> {
    let n = conn.execute("DELETE FROM tweets WHERE id = ?1", [id.0])?;
    Ok(n > 0)
}

// -- Media --

pub fn insert_media(
    conn: &Connection,
    filename: &str,
    storage_path: &str,
    mime_type: Option<&str>,
    created_at: DateTime<Utc>,
) -> Result<MediaId> {
    conn.execute(
        "INSERT INTO media (filename, storage_path, mime_type, created_at) VALUES (?1, ?2, ?3, ?4)",
        (filename, storage_path, mime_type, created_at),
    )?;
    Ok(MediaId(conn.last_insert_rowid()))
}

/// True if the media row exists and its file has not been discarded.
pub fn media_available(conn: &Connection, id: MediaId) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM media WHERE id = ?1 AND discarded = 0)",
        [id.0],
        |row| row.get(0),
    )
}

/// Attaching the same media twice is a no-op.
pub fn attach_media(conn: &Connection, tweet: TweetId, media: MediaId) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO tweet_media (tweet_id, media_id) VALUES (?1, ?2)",
        [tweet.0, media.0],
    )?;
    Ok(())
}

/// Marks media attached to `tweet` whose file no other tweet uses as
/// discarded and returns their storage paths. Sharing is decided by storage
/// path, so two rows naming the same file count as one. Discarded media can
/// no longer be attached.
pub fn discard_exclusive_media(conn: &Connection, tweet: TweetId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.storage_path
         FROM tweet_media tm
         JOIN media m ON m.id = tm.media_id
         WHERE tm.tweet_id = ?1
           AND m.discarded = 0
           AND NOT EXISTS (
               SELECT 1 FROM tweet_media other
               JOIN media om ON om.id = other.media_id
               WHERE om.storage_path = m.storage_path AND other.tweet_id <> tm.tweet_id
           )
         ORDER BY m.id",
    )?;
    let rows = stmt
        .query_map([tweet.0], |row| Ok((MediaId(row.get(0)?), row.get(1)?)))?
        .collect::<Result<Vec<(MediaId, String)>>>()?;
    mark_discarded(conn, rows)
}

/// Same as [`discard_exclusive_media`] for every tweet written by `author`:
/// files used only by `author`'s tweets.
pub fn discard_exclusive_media_of_author(conn: &Connection, author: UserId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.storage_path
         FROM media m
         WHERE m.discarded = 0
           AND EXISTS (
               SELECT 1 FROM tweet_media tm
               JOIN tweets t ON t.id = tm.tweet_id
               WHERE tm.media_id = m.id AND t.author_id = ?1
           )
           AND NOT EXISTS (
               SELECT 1 FROM tweet_media tm
               JOIN tweets t ON t.id = tm.tweet_id
               JOIN media om ON om.id = tm.media_id
               WHERE om.storage_path = m.storage_path AND t.author_id <> ?1
           )
         ORDER BY m.id",
    )?;
    let rows = stmt
        .query_map([author.0], |row| Ok((MediaId(row.get(0)?), row.get(1)?)))?
        .collect::<Result<Vec<(MediaId, String)>>>()?;
    mark_discarded(conn, rows)
}

fn mark_discarded(conn: &Connection, rows: Vec<(MediaId, String)>) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("UPDATE media SET discarded = 1 WHERE id = ?1")?;
    let mut paths = Vec::with_capacity(rows.len());
    for (id, path) in rows {
        stmt.execute([id.0])?;
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    Ok(paths)
}

// -- Likes --

/// Fails with a UNIQUE violation if the like already exists.
pub fn insert_like(
    conn: &Connection,
    user: UserId,
    tweet: TweetId,
    created_at: DateTime<Utc>,
) -> Result<LikeId> {
    conn.execute(
        "INSERT INTO likes (user_id, tweet_id, created_at) VALUES (?1, ?2, ?3)",
        (user.0, tweet.0, created_at),
    )?;
    Ok(LikeId(conn.last_insert_rowid()))
}

pub fn has_like(conn: &Connection, user: UserId, tweet: TweetId) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND tweet_id = ?2)",
        [user.0, tweet.0],
        |row| row.get(0),
    )
}

/// Returns false if there was no such like.
pub fn delete_like(conn: &Connection, user: UserId, tweet: TweetId) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM likes WHERE user_id = ?1 AND tweet_id = ?2",
        [user.0, tweet.0],
    )?;
    Ok(n > 0)
}

pub fn adjust_like_count(conn: &Connection, tweet: TweetId, delta: i64) -> Result<()> {
    conn.execute(
        "UPDATE tweets SET like_count = like_count + ?2 WHERE id = ?1",
        [tweet.0, delta],
    )?;
    Ok(())
}

/// Takes `user`'s likes out of the counters of every tweet they liked.
/// Must run before the likes themselves are removed.
pub fn release_likes_of_user(conn: &Connection, user: UserId) -> Result<usize> {
    conn.execute(
        "UPDATE tweets SET like_count = like_count - 1
         WHERE id IN (SELECT tweet_id FROM likes WHERE user_id = ?1)",
        [user.0],
    )
}

pub fn like_count(conn: &Connection, tweet: TweetId) -> Result<Option<i64>> {
    conn.query_row("SELECT like_count FROM tweets WHERE id = ?1", [tweet.0], |row| {
        row.get(0)
    })
    .optional()
}

/// Counts like rows directly; the denormalized counter must agree with it.
pub fn count_like_rows(conn: &Connection, tweet: TweetId) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM likes WHERE tweet_id = ?1", [tweet.0], |row| {
        row.get(0)
    })
}
