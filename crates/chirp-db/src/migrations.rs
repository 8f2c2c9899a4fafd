use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                credential_key  TEXT NOT NULL UNIQUE,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE follows (
                follower_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                following_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL,
                PRIMARY KEY (follower_id, following_id),
                CHECK (follower_id <> following_id)
            );

            CREATE INDEX idx_follows_following ON follows(following_id);

            CREATE TABLE tweets (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                like_count      INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0)
            );

            CREATE INDEX idx_tweets_author_created ON tweets(author_id, created_at DESC);
            CREATE INDEX idx_tweets_created ON tweets(created_at DESC, id DESC);

            CREATE TABLE media (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                filename        TEXT NOT NULL,
                storage_path    TEXT NOT NULL,
                mime_type       TEXT,
                created_at      TEXT NOT NULL,
                discarded       INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE tweet_media (
                tweet_id        INTEGER NOT NULL REFERENCES tweets(id) ON DELETE CASCADE,
                media_id        INTEGER NOT NULL REFERENCES media(id) ON DELETE CASCADE,
                PRIMARY KEY (tweet_id, media_id)
            );

            CREATE INDEX idx_tweet_media_media ON tweet_media(media_id);

            CREATE TABLE likes (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                tweet_id        INTEGER NOT NULL REFERENCES tweets(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL,
                UNIQUE (user_id, tweet_id)
            );

            CREATE INDEX idx_likes_tweet ON likes(tweet_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
