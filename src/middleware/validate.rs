use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, FieldError};

/// Request bodies that check themselves and turn into a trusted value.
pub trait Validate: Sized {
    type Valid;

    fn validate(self) -> Result<Self::Valid, Vec<FieldError>>;
}

/// JSON body extractor that rejects with field-level `400`s.
pub struct ValidJson<T: Validate>(pub T::Valid);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::Validation(vec![FieldError::new("body", rejection.body_text())])
            })?;
        body.validate().map(ValidJson).map_err(AppError::Validation)
    }
}
