use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::{AppError, Result},
    middleware::AuthUser,
    state::AppState,
};
use super::upload_service::UploadResponse;

/// Upload a message attachment
#[utoipa::path(
    post,
    path = "/api/messages/upload",
    tag = "messages",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "Multipart form with a `file` field"
    ),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file or unsupported type"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "File too large")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::Validation(format!("Invalid multipart body: {}", rejection.body_text()))
    })?;

    let read_error = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("File exceeds the 10 MB limit".to_string())
        } else {
            AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(read_error)?;

        tracing::debug!(%user_id, size = data.len(), "Received upload");

        let response = state
            .upload_service
            .save(file_name.as_deref(), &content_type, &data)
            .await?;

        return Ok((StatusCode::OK, Json(response)));
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}
