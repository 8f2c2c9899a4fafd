use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chirp_core::Authenticator;
use chirp_types::UserId;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

pub const API_KEY_HEADER: &str = "api-key";

/// The caller, as resolved from the `api-key` header.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

/// Resolve the `api-key` header and attach the user to the request.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let auth = state.services.auth.clone();
    let user = blocking(move || auth.resolve(key.as_deref())).await?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
