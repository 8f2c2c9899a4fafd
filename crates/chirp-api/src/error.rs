use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chirp_core::CoreError;
use chirp_types::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Core(e) => match e {
                CoreError::Validation(_) | CoreError::SelfFollow => StatusCode::BAD_REQUEST,
                CoreError::Authentication => StatusCode::UNAUTHORIZED,
                CoreError::Forbidden => StatusCode::FORBIDDEN,
                CoreError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                CoreError::Storage(_) | CoreError::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
                e if e.is_not_found() => StatusCode::NOT_FOUND,
                e if e.is_conflict() => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the log.
        let error_message = if status.is_server_error() {
            error!("Request failed: {}", error_chain(&self));
            status.canonical_reason().unwrap_or("error").to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            result: false,
            error_type: status.canonical_reason().unwrap_or("Error").to_string(),
            error_message,
        };
        (status, Json(body)).into_response()
    }
}

/// Error chain joined with `: ` for logging.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (CoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::SelfFollow, StatusCode::BAD_REQUEST),
            (CoreError::AlreadyFollowing, StatusCode::CONFLICT),
            (CoreError::NotFollowing, StatusCode::CONFLICT),
            (CoreError::CredentialTaken, StatusCode::CONFLICT),
            (CoreError::TweetNotFound, StatusCode::NOT_FOUND),
            (CoreError::LikeNotFound, StatusCode::NOT_FOUND),
            (CoreError::Forbidden, StatusCode::FORBIDDEN),
            (CoreError::Authentication, StatusCode::UNAUTHORIZED),
            (CoreError::StorageUnavailable, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
