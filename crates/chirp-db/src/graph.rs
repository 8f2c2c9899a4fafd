//! Users and the directed follow relation.
//!
//! Follow edges live in `follows(follower_id, following_id)` and are only
//! ever looked up by key; nothing here builds an in-memory graph.

use chirp_types::UserId;
use chirp_types::models::{User, UserSummary};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result};

// -- Users --

pub fn insert_user(
    conn: &Connection,
    name: &str,
    credential_key: &str,
    created_at: DateTime<Utc>,
) -> Result<UserId> {
    conn.execute(
        "INSERT INTO users (name, credential_key, created_at) VALUES (?1, ?2, ?3)",
        (name, credential_key, created_at),
    )?;
    Ok(UserId(conn.last_insert_rowid()))
}

pub fn get_user(conn: &Connection, id: UserId) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, name, created_at FROM users WHERE id = ?1",
        [id.0],
        |row| {
            Ok(User {
                id: UserId(row.get(0)?),
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn user_exists(conn: &Connection, id: UserId) -> Result<bool> {
    conn.query_row("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)", [id.0], |row| {
        row.get(0)
    })
}

pub fn find_user_by_credential(conn: &Connection, credential_key: &str) -> Result<Option<UserId>> {
    conn.query_row(
        "SELECT id FROM users WHERE credential_key = ?1",
        [credential_key],
        |row| row.get(0).map(UserId),
    )
    .optional()
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}

/// Deletes the user; tweets, likes and follow edges go with it through
/// `ON DELETE CASCADE`. Returns false if there was no such user.
pub fn delete_user(conn: &Connection, id: UserId) -> Result<bool> {
    let n = conn.execute("DELETE FROM users WHERE id = ?1", [id.0])?;
    Ok(n > 0)
}

// -- Follows --

pub fn is_following(conn: &Connection, follower: UserId, following: UserId) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2)",
        [follower.0, following.0],
        |row| row.get(0),
    )
}

pub fn insert_follow(
    conn: &Connection,
    follower: UserId,
    following: UserId,
    created_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
        (follower.0, following.0, created_at),
    )?;
    Ok(())
}

/// Returns false if the edge did not exist.
pub fn delete_follow(conn: &Connection, follower: UserId, following: UserId) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
        [follower.0, following.0],
    )?;
    Ok(n > 0)
}

/// Users with an edge into `user`.
pub fn followers(conn: &Connection, user: UserId) -> Result<Vec<UserSummary>> {
    query_summaries(
        conn,
        "SELECT u.id, u.name
         FROM follows f
         JOIN users u ON u.id = f.follower_id
         WHERE f.following_id = ?1
         ORDER BY u.id",
        user,
    )
}

/// Users `user` has an edge to.
pub fn following(conn: &Connection, user: UserId) -> Result<Vec<UserSummary>> {
    query_summaries(
        conn,
        "SELECT u.id, u.name
         FROM follows f
         JOIN users u ON u.id = f.following_id
         WHERE f.follower_id = ?1
         ORDER BY u.id",
        user,
    )
}

fn query_summaries(conn: &Connection, sql: &str, user: UserId) -> Result<Vec<UserSummary>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([user.0], |row| {
            Ok(UserSummary {
                id: UserId(row.get(0)?),
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn user(db: &Database, name: &str) -> UserId {
        db.write(|conn| insert_user(conn, name, &format!("key-{name}"), Utc::now()))
            .unwrap()
    }

    #[test]
    fn ids_are_assigned_in_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(user(&db, "a"), UserId(1));
        assert_eq!(user(&db, "b"), UserId(2));
    }

    #[test]
    fn credential_lookup() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "a");

        let found = db.read(|conn| find_user_by_credential(conn, "key-a")).unwrap();
        assert_eq!(found, Some(a));
        let missing = db.read(|conn| find_user_by_credential(conn, "nope")).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn follow_edges_are_directed() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "a");
        let b = user(&db, "b");

        db.write(|conn| insert_follow(conn, a, b, Utc::now())).unwrap();

        db.read(|conn| {
            assert!(is_following(conn, a, b)?);
            assert!(!is_following(conn, b, a)?);
            assert_eq!(followers(conn, b)?, vec![UserSummary { id: a, name: "a".into() }]);
            assert!(followers(conn, a)?.is_empty());
            assert_eq!(following(conn, a)?, vec![UserSummary { id: b, name: "b".into() }]);
            Ok::<_, rusqlite::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn storage_rejects_duplicate_and_self_edges() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "a");
        let b = user(&db, "b");

        db.write(|conn| insert_follow(conn, a, b, Utc::now())).unwrap();
        let dup = db.write(|conn| insert_follow(conn, a, b, Utc::now())).unwrap_err();
        assert!(crate::is_unique_violation(&dup));

        assert!(db.write(|conn| insert_follow(conn, a, a, Utc::now())).is_err());
    }

    #[test]
    fn delete_follow_reports_missing_edge() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "a");
        let b = user(&db, "b");

        assert!(!db.write(|conn| delete_follow(conn, a, b)).unwrap());
        db.write(|conn| insert_follow(conn, a, b, Utc::now())).unwrap();
        assert!(db.write(|conn| delete_follow(conn, a, b)).unwrap());
    }

    #[test]
    fn deleting_a_user_drops_edges_both_ways() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "a");
        let b = user(&db, "b");
        let c = user(&db, "c");

        db.write(|conn| {
            insert_follow(conn, a, b, Utc::now())?;
            insert_follow(conn, b, c, Utc::now())?;
            insert_follow(conn, c, b, Utc::now())
        })
        .unwrap();

        assert!(db.write(|conn| delete_user(conn, b)).unwrap());

        let edges: i64 = db
            .read(|conn| conn.query_row("SELECT COUNT(*) FROM follows", [], |r| r.get(0)))
            .unwrap();
        assert_eq!(edges, 0);
        assert!(!db.read(|conn| user_exists(conn, b)).unwrap());
    }
}
