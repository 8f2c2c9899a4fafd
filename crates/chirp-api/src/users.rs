use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chirp_types::UserId;
use chirp_types::api::{ProfileResponse, ResultResponse};

use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

pub async fn me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    profile_of(&state, user).await
}

pub async fn profile(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
    Extension(_caller): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    profile_of(&state, user_id).await
}

async fn profile_of(state: &AppState, user: UserId) -> Result<Json<ProfileResponse>, ApiError> {
    let accounts = state.services.accounts.clone();
    let profile = blocking(move || accounts.profile(user)).await?;
    Ok(Json(ProfileResponse {
        result: true,
        user: profile,
    }))
}

pub async fn delete_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.services.accounts.clone();
    blocking(move || accounts.delete_user(user)).await?;
    Ok(Json(ResultResponse::ok()))
}

pub async fn follow(
    State(state): State<AppState>,
    ApiPath(target): ApiPath<UserId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let relationships = state.services.relationships.clone();
    blocking(move || relationships.follow(user, target)).await?;
    Ok((StatusCode::CREATED, Json(ResultResponse::ok())))
}

pub async fn unfollow(
    State(state): State<AppState>,
    ApiPath(target): ApiPath<UserId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let relationships = state.services.relationships.clone();
    blocking(move || relationships.unfollow(user, target)).await?;
    Ok(Json(ResultResponse::ok()))
}
