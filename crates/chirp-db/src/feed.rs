//! Batch queries behind feed assembly. One query for tweets with their
//! authors, then one query per id chunk for attachments and for likers,
//! never one query per tweet.

use chirp_types::{TweetId, UserId};
use rusqlite::types::ToSql;
use rusqlite::{Connection, Result, Row};

use crate::models::{AttachmentRow, FeedTweetRow, LikerRow};

/// Upper bound on ids bound into a single `IN (...)` list.
pub const MAX_BATCH: usize = 500;

const TWEET_COLUMNS: &str =
    "SELECT t.id, t.author_id, u.name, t.content, t.created_at, t.like_count
     FROM tweets t
     JOIN users u ON u.id = t.author_id";

/// Every tweet, newest first.
pub fn all_tweets(conn: &Connection) -> Result<Vec<FeedTweetRow>> {
    let sql = format!("{TWEET_COLUMNS} ORDER BY t.created_at DESC, t.id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], tweet_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(rows)
}

/// Tweets by accounts `user` follows, newest first. With `include_own`,
/// `user`'s own tweets are mixed in.
pub fn tweets_followed_by(
    conn: &Connection,
    user: UserId,
    include_own: bool,
) -> Result<Vec<FeedTweetRow>> {
    let sql = format!(
        "{TWEET_COLUMNS}
         WHERE t.author_id IN (SELECT following_id FROM follows WHERE follower_id = ?1)
            OR (?2 AND t.author_id = ?1)
         ORDER BY t.created_at DESC, t.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map((user.0, include_own), tweet_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(rows)
}

/// Attachments of the given tweets, ordered by tweet then media id.
pub fn attachments_for(conn: &Connection, tweet_ids: &[TweetId]) -> Result<Vec<AttachmentRow>> {
    let mut out = Vec::new();
    for chunk in tweet_ids.chunks(MAX_BATCH) {
        let sql = format!(
            "SELECT tm.tweet_id, m.storage_path
             FROM tweet_media tm
             JOIN media m ON m.id = tm.media_id
             WHERE tm.tweet_id IN ({})
             ORDER BY tm.tweet_id, m.id",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(id_params(chunk).as_slice(), |row| {
            Ok(AttachmentRow {
                tweet_id: TweetId(row.get(0)?),
                storage_path: row.get(1)?,
            })
        })?;
        for row in rows {
            out.push(row?);
        }
    }
    Ok(out)
}

/// Likers of the given tweets, ordered by tweet then like id.
pub fn likers_for(conn: &Connection, tweet_ids: &[TweetId]) -> Result<Vec<LikerRow>> {
    let mut out = Vec::new();
    for chunk in tweet_ids.chunks(MAX_BATCH) {
        let sql = format!(
            "SELECT l.tweet_id, u.id, u.name
             FROM likes l
             JOIN users u ON u.id = l.user_id
             WHERE l.tweet_id IN ({})
             ORDER BY l.tweet_id, l.id",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(id_params(chunk).as_slice(), |row| {
            Ok(LikerRow {
                tweet_id: TweetId(row.get(0)?),
                user_id: UserId(row.get(1)?),
                name: row.get(2)?,
            })
        })?;
        for row in rows {
            out.push(row?);
        }
    }
    Ok(out)
}

fn tweet_row(row: &Row<'_>) -> Result<FeedTweetRow> {
    Ok(FeedTweetRow {
        id: TweetId(row.get(0)?),
        author_id: UserId(row.get(1)?),
        author_name: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        like_count: row.get(5)?,
    })
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

fn id_params(ids: &[TweetId]) -> Vec<&dyn ToSql> {
    ids.iter().map(|id| &id.0 as &dyn ToSql).collect()
}
