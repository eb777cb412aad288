use chrono::Utc;
use common::storage::ImageStore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::instrument;

use super::{Caller, CoverImage, PostError, PostInput, require_owner, store_upload, validate_input};
use crate::entity::{post, user};

/// Number of posts per page in listings.
pub const PAGE_SIZE: u64 = 10;

/// A post together with its author, if the author still exists.
pub type PostWithAuthor = (post::Model, Option<user::Model>);

/// One page of posts, newest first.
#[derive(Debug)]
pub struct PostPage {
    pub items: Vec<PostWithAuthor>,
    /// 1-based page number.
    pub page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Create, read, update and delete posts along with their cover images.
pub struct PostService<'a, C: ConnectionTrait> {
    conn: &'a C,
    images: &'a dyn ImageStore,
    max_image_size: u64,
}

impl<'a, C: ConnectionTrait> PostService<'a, C> {
    pub fn new(conn: &'a C, images: &'a dyn ImageStore, max_image_size: u64) -> Self {
        Self {
            conn,
            images,
            max_image_size,
        }
    }

    /// List all posts, newest first.
    pub async fn list(&self, page: u64) -> Result<PostPage, PostError> {
        self.list_page(None, page).await
    }

    /// List the caller's own posts, newest first.
    pub async fn list_by_owner(&self, caller: &Caller, page: u64) -> Result<PostPage, PostError> {
        self.list_page(Some(caller.user_id), page).await
    }

    async fn list_page(&self, owner: Option<i32>, page: u64) -> Result<PostPage, PostError> {
        let page = page.max(1);

        let mut select = post::Entity::find();
        if let Some(owner) = owner {
            select = select.filter(post::Column::UserId.eq(owner));
        }

        let total = select
            .clone()
            .paginate(self.conn, PAGE_SIZE)
            .num_items()
            .await?;

        let total_pages = total.div_ceil(PAGE_SIZE);

        // Pages past the end are empty; this also keeps the offset in range.
        let offset = match (page - 1).checked_mul(PAGE_SIZE) {
            Some(offset) if page <= total_pages => offset,
            _ => {
                return Ok(PostPage {
                    items: Vec::new(),
                    page,
                    total,
                    total_pages,
                });
            }
        };

        let items = select
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .find_also_related(user::Entity)
            .offset(Some(offset))
            .limit(Some(PAGE_SIZE))
            .all(self.conn)
            .await?;

        Ok(PostPage {
            items,
            page,
            total,
            total_pages,
        })
    }

    /// Fetch a post and its author.
    pub async fn show(&self, id: i32) -> Result<PostWithAuthor, PostError> {
        post::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(self.conn)
            .await?
            .ok_or(PostError::NotFound(id))
    }

    /// Attach the author to a post returned by create, edit or update.
    pub async fn with_author(&self, post: post::Model) -> Result<PostWithAuthor, PostError> {
        let author = post.find_related(user::Entity).one(self.conn).await?;
        Ok((post, author))
    }

    /// Fetch a post for editing; only its owner may see it.
    pub async fn edit(&self, id: i32, caller: &Caller) -> Result<post::Model, PostError> {
        let post = self.find(id).await?;
        require_owner(&post, caller)?;
        Ok(post)
    }

    #[instrument(skip(self, input), fields(user_id = caller.user_id))]
    pub async fn create(&self, input: PostInput, caller: &Caller) -> Result<post::Model, PostError> {
        validate_input(&input, self.max_image_size)?;

        let cover = match &input.cover_image {
            Some(upload) => CoverImage::Stored(store_upload(self.images, upload).await?),
            None => CoverImage::None,
        };

        let now = Utc::now();
        let new_post = post::ActiveModel {
            title: Set(input.title.trim().to_string()),
            body: Set(input.body),
            user_id: Set(caller.user_id),
            cover_image: Set(cover.into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = new_post.insert(self.conn).await?;
        tracing::info!(post_id = model.id, "Post created");
        Ok(model)
    }

    /// Overwrite title and body. A supplied image replaces the current cover,
    /// whose file is deleted once the record points at the new one.
    #[instrument(skip(self, input), fields(user_id = caller.user_id))]
    pub async fn update(
        &self,
        id: i32,
        input: PostInput,
        caller: &Caller,
    ) -> Result<post::Model, PostError> {
        let existing = self.find(id).await?;
        require_owner(&existing, caller)?;
        validate_input(&input, self.max_image_size)?;

        let previous = existing.cover();
        let replacement = match &input.cover_image {
            Some(upload) => Some(store_upload(self.images, upload).await?),
            None => None,
        };

        let mut active: post::ActiveModel = existing.into();
        active.title = Set(input.title.trim().to_string());
        active.body = Set(input.body);
        active.updated_at = Set(Utc::now());
        if let Some(name) = &replacement {
            active.cover_image = Set(Some(name.clone()));
        }

        let model = active.update(self.conn).await?;

        if replacement.is_some()
            && let CoverImage::Stored(old) = previous
        {
            self.remove_image(&old).await?;
        }

        tracing::info!(post_id = model.id, "Post updated");
        Ok(model)
    }

    /// Delete a post and its stored cover image.
    #[instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn destroy(&self, id: i32, caller: &Caller) -> Result<(), PostError> {
        let existing = self.find(id).await?;
        require_owner(&existing, caller)?;

        if let CoverImage::Stored(name) = existing.cover() {
            self.remove_image(&name).await?;
        }

        post::Entity::delete_by_id(id).exec(self.conn).await?;
        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }

    async fn find(&self, id: i32) -> Result<post::Model, PostError> {
        post::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(PostError::NotFound(id))
    }

    async fn remove_image(&self, name: &str) -> Result<(), PostError> {
        if !self.images.delete(name).await? {
            tracing::warn!(name, "Cover image was already missing from storage");
        }
        Ok(())
    }
}
