use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body whose rejections surface as `VALIDATION_ERROR`.
///
/// Used by the auth endpoints; post forms arrive as multipart instead.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| AppJson(value))
            .map_err(|rejection| {
                tracing::debug!(status = %rejection.status(), "Rejected JSON body");
                AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
            })
    }
}
