pub mod api;
pub mod ids;
pub mod models;

pub use ids::{LikeId, MediaId, TweetId, UserId};
