use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::post::{PostForm, PostListResponse, PostResponse};
use crate::models::shared::PageQuery;
use crate::post::{ImageUpload, PostInput};
use crate::state::AppState;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(8 * 1024 * 1024) // 8 MB
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Posts",
    operation_id = "listPosts",
    summary = "List posts",
    description = "Returns posts newest first, 10 per page. No authentication required.",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of posts", body = PostListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = state.posts().list(query.page.unwrap_or(1)).await?;
    Ok(Json(PostListResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/me/posts",
    tag = "Posts",
    operation_id = "listMyPosts",
    summary = "List the current user's posts",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of the caller's posts", body = PostListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_my_posts(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = state
        .posts()
        .list_by_owner(&auth_user.caller(), query.page.unwrap_or(1))
        .await?;
    Ok(Json(PostListResponse::from(page)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Posts",
    operation_id = "createPost",
    summary = "Create a post",
    description = "Creates a post owned by the caller. `title` and `body` are required; \
        `cover_image` is an optional image file.",
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Image storage failed (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let input = read_post_form(multipart).await?;
    let posts = state.posts();
    let model = posts.create(input, &auth_user.caller()).await?;
    let post = posts.with_author(model).await?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Posts",
    operation_id = "getPost",
    summary = "Get a post",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    let post = state.posts().show(id).await?;
    Ok(Json(PostResponse::from(post)))
}

#[utoipa::path(
    get,
    path = "/{id}/edit",
    tag = "Posts",
    operation_id = "editPost",
    summary = "Get a post for editing",
    description = "Returns the post only if the caller owns it.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn edit_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    let posts = state.posts();
    let model = posts.edit(id, &auth_user.caller()).await?;
    let post = posts.with_author(model).await?;
    Ok(Json(PostResponse::from(post)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Posts",
    operation_id = "updatePost",
    summary = "Update a post",
    description = "Overwrites `title` and `body`. A supplied `cover_image` replaces the current \
        cover and deletes the old file; without one the cover is kept.",
    params(("id" = i32, Path, description = "Post ID")),
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Image storage failed (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn update_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<PostResponse>, AppError> {
    let input = read_post_form(multipart).await?;
    let posts = state.posts();
    let model = posts.update(id, input, &auth_user.caller()).await?;
    let post = posts.with_author(model).await?;

    Ok(Json(PostResponse::from(post)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Posts",
    operation_id = "deletePost",
    summary = "Delete a post",
    description = "Deletes the post and its stored cover image.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Image storage failed (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    state.posts().destroy(id, &auth_user.caller()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Collect `title`, `body` and `cover_image` from a multipart form.
///
/// The whole form is consumed before returning; size and type checks happen
/// in validation. Missing text fields are left empty for validation to reject.
/// A file part without a filename and without content counts as no image.
async fn read_post_form(mut multipart: Multipart) -> Result<PostInput, AppError> {
    let mut title = String::new();
    let mut body = String::new();
    let mut cover_image: Option<ImageUpload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("title") => {
                title = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read title: {e}")))?;
            }
            Some("body") => {
                body = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read body: {e}")))?;
            }
            Some("cover_image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(|s| s.to_string());

                let mut data = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
                {
                    data.extend_from_slice(&chunk);
                }

                if file_name.is_empty() && data.is_empty() {
                    continue;
                }

                cover_image = Some(ImageUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(PostInput {
        title,
        body,
        cover_image,
    })
}
