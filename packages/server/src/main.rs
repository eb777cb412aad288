use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemImageStore;
use tracing::{Level, info};

use blog_server::config::AppConfig;
use blog_server::database::init_db;
use blog_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database ready");

    let images = FilesystemImageStore::new(
        config.storage.image_dir.clone(),
        config.storage.max_image_size,
    )
    .await
    .context("Failed to open image storage")?;
    info!(path = %images.base_path().display(), "Image storage ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config,
        images: Arc::new(images),
    };
    let app = blog_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
