use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chirp_types::api::MediaUploadResponse;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

const FILE_FIELD: &str = "file";

/// POST /api/medias: multipart upload, field `file`. Returns the media id
/// to reference from a later tweet.
pub async fn upload_media(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let engagement = state.services.engagement.clone();
        let media_id = blocking(move || {
            engagement.upload_media(&filename, mime_type.as_deref(), &bytes)
        })
        .await?;

        return Ok((
            StatusCode::CREATED,
            Json(MediaUploadResponse {
                result: true,
                media_id,
            }),
        ));
    }

    Err(ApiError::BadRequest(format!(
        "multipart field `{}` is missing",
        FILE_FIELD
    )))
}
