use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::{post, user};
use crate::models::shared::Pagination;
use crate::post::{PAGE_SIZE, PostPage, PostWithAuthor};

/// Public path under which stored cover images are served.
pub const IMAGE_BASE_PATH: &str = "/api/v1/images";

/// Author summary embedded in post responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AuthorResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_writes")]
    pub username: String,
}

impl From<user::Model> for AuthorResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// A single post.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PostResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Hello")]
    pub title: String,
    /// Rich text body, unescaped.
    #[schema(example = "<p>World</p>")]
    pub body: String,
    /// Stored cover image name, or null when the post has no cover.
    #[schema(example = "sunset_01936f0e12347abc8000000000000001.png")]
    pub cover_image: Option<String>,
    /// Public URL of the cover image, or null.
    #[schema(example = "/api/v1/images/sunset_01936f0e12347abc8000000000000001.png")]
    pub cover_image_url: Option<String>,
    pub user_id: i32,
    /// Author, when the post was loaded together with its user.
    pub author: Option<AuthorResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    fn build(model: post::Model, author: Option<user::Model>) -> Self {
        let cover_image_url = model
            .cover()
            .name()
            .map(|name| format!("{IMAGE_BASE_PATH}/{name}"));
        Self {
            id: model.id,
            title: model.title,
            body: model.body,
            cover_image: model.cover_image,
            cover_image_url,
            user_id: model.user_id,
            author: author.map(AuthorResponse::from),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<post::Model> for PostResponse {
    fn from(model: post::Model) -> Self {
        Self::build(model, None)
    }
}

impl From<PostWithAuthor> for PostResponse {
    fn from((model, author): PostWithAuthor) -> Self {
        Self::build(model, author)
    }
}

/// Paginated list of posts, newest first.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PostListResponse {
    pub data: Vec<PostResponse>,
    pub pagination: Pagination,
}

impl From<PostPage> for PostListResponse {
    fn from(page: PostPage) -> Self {
        Self {
            data: page.items.into_iter().map(PostResponse::from).collect(),
            pagination: Pagination {
                page: page.page,
                per_page: PAGE_SIZE,
                total: page.total,
                total_pages: page.total_pages,
            },
        }
    }
}

/// Multipart form accepted by create and update (documentation only).
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct PostForm {
    /// Post title (1-256 characters).
    pub title: String,
    /// Post body (required).
    pub body: String,
    /// Optional cover image (jpg, jpeg, png, gif, bmp, svg, webp).
    #[schema(value_type = Option<String>, format = Binary)]
    pub cover_image: Option<Vec<u8>>,
}
