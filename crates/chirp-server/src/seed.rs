use anyhow::Result;
use chirp_core::Services;
use chirp_db::{Database, graph};
use tracing::info;

/// Demo users, follows, tweets and likes for a fresh database. Does
/// nothing once any user exists.
pub fn seed_if_empty(db: &Database, services: &Services) -> Result<()> {
    let users: i64 = db.read(|conn| graph::count_users(conn))?;
    if users > 0 {
        info!("Seed skipped: database already has {} users", users);
        return Ok(());
    }

    let u1 = services.accounts.register("Testov Test", "test")?;
    let u2 = services.accounts.register("Maria Sm", "test_2")?;
    let u3 = services.accounts.register("Oleg Kric", "test_3")?;

    services.relationships.follow(u1, u2)?;
    services.relationships.follow(u1, u3)?;
    services.relationships.follow(u2, u3)?;

    let t1 = services
        .engagement
        .create_tweet(u2, "Good morning everyone! Here is a photo of our office.", &[])?;
    let t2 = services
        .engagement
        .create_tweet(u3, "Release today at 18:00. Ready? #deploy", &[])?;
    services
        .engagement
        .create_tweet(u2, "Quick note: updated the documentation.", &[])?;

    services.engagement.like_tweet(u1, t1)?;
    services.engagement.like_tweet(u1, t2)?;

    info!("Seed done: 3 users, 3 follows, 3 tweets, 2 likes");
    Ok(())
}
