use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chirp_types::TweetId;
use chirp_types::api::{
    CreateTweetRequest, CreateTweetResponse, FeedResponse, ResultResponse, TweetView,
};
use chirp_types::models::FeedEntry;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreateTweetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engagement = state.services.engagement.clone();
    let tweet_id = blocking(move || {
        engagement.create_tweet(user, &req.tweet_data, &req.tweet_media_ids)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTweetResponse {
            result: true,
            tweet_id,
        }),
    ))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    ApiPath(tweet_id): ApiPath<TweetId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let engagement = state.services.engagement.clone();
    blocking(move || engagement.delete_tweet(user, tweet_id)).await?;
    Ok(Json(ResultResponse::ok()))
}

pub async fn like_tweet(
    State(state): State<AppState>,
    ApiPath(tweet_id): ApiPath<TweetId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let engagement = state.services.engagement.clone();
    blocking(move || engagement.like_tweet(user, tweet_id)).await?;
    Ok((StatusCode::CREATED, Json(ResultResponse::ok())))
}

pub async fn unlike_tweet(
    State(state): State<AppState>,
    ApiPath(tweet_id): ApiPath<TweetId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let engagement = state.services.engagement.clone();
    blocking(move || engagement.unlike_tweet(user, tweet_id)).await?;
    Ok(Json(ResultResponse::ok()))
}

/// GET /api/tweets: tweets from accounts the caller follows.
pub async fn feed(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let assembler = state.services.feed.clone();
    let entries = blocking(move || assembler.feed_for_user(user)).await?;
    Ok(Json(render(entries, &state.media_url_prefix)))
}

/// GET /api/tweets/global: every tweet.
pub async fn global_feed(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let assembler = state.services.feed.clone();
    let entries = blocking(move || assembler.global_feed()).await?;
    Ok(Json(render(entries, &state.media_url_prefix)))
}

fn render(entries: Vec<FeedEntry>, media_prefix: &str) -> FeedResponse {
    FeedResponse {
        result: true,
        tweets: entries
            .into_iter()
            .map(|e| TweetView::from_entry(e, media_prefix))
            .collect(),
    }
}
