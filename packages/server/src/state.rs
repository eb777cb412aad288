use std::sync::Arc;

use common::storage::ImageStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::post::PostService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    /// Post service bound to this state's database and image store.
    pub fn posts(&self) -> PostService<'_, DatabaseConnection> {
        PostService::new(&self.db, &*self.images, self.config.storage.max_image_size)
    }
}
