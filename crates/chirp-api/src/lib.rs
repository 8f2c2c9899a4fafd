pub mod error;
pub mod extract;
pub mod media;
pub mod middleware;
pub mod state;
pub mod tweets;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Every `/api` route, behind the api-key middleware.
pub fn router(state: AppState) -> Router {
    let upload_limit = state.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/api/tweets", get(tweets::feed).post(tweets::create_tweet))
        .route("/api/tweets/global", get(tweets::global_feed))
        .route("/api/tweets/{tweet_id}", delete(tweets::delete_tweet))
        .route(
            "/api/tweets/{tweet_id}/likes",
            post(tweets::like_tweet).delete(tweets::unlike_tweet),
        )
        .route(
            "/api/medias",
            post(media::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/users/me", get(users::me).delete(users::delete_me))
        .route("/api/users/{user_id}", get(users::profile))
        .route(
            "/api/users/{user_id}/follow",
            post(users::follow).delete(users::unfollow),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ))
        .with_state(state)
}
