mod v1;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

/// Mount point of the versioned API.
pub const API_PREFIX: &str = "/api/v1";

/// Every API route, mounted under [`API_PREFIX`].
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(API_PREFIX, v1::routes())
}
