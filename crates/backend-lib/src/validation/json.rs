//! JSON body extractor that runs the payload's constraint set.

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use super::Validate;
use crate::error::AppError;

/// Like [`axum::Json`], but normalizes the payload and rejects with a list
/// of violations before the handler runs.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state).await?;
        value.normalize();
        value.validate()?;
        Ok(Self(value))
    }
}
