use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::utils::filename::validate_flat_filename;

#[utoipa::path(
    get,
    path = "/{name}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Download a cover image",
    description = "Streams a stored cover image. Stored names are unique per upload, so the \
        name doubles as the ETag.",
    params(("name" = String, Path, description = "Stored image name")),
    responses(
        (status = 200, description = "Image content", content_type = "application/octet-stream"),
        (status = 304, description = "Not modified"),
        (status = 400, description = "Invalid name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let name = validate_flat_filename(&name)
        .map_err(|e| AppError::Validation(e.message().into()))?;

    let etag_value = format!("\"{name}\"");
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
        && state.images.exists(name).await?
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let size = state.images.size(name).await?;
    let reader = state.images.get_stream(name).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = mime_guess::from_path(name).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
