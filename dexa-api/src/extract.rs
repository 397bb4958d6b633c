//! JSON body extractor whose rejections use the API error envelope.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// Like [`Json`], but malformed bodies become `400 {"error", "details"}`
/// and the payload is validated before the handler runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value): Json<T> = Json::from_request(req, state).await?;
        value.validate()?;
        Ok(ApiJson(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let details = match &rejection {
            JsonRejection::JsonDataError(e) => format!("Invalid JSON data: {}", e.body_text()),
            JsonRejection::JsonSyntaxError(e) => format!("Invalid JSON syntax: {}", e.body_text()),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing Content-Type: application/json header".to_string()
            }
            JsonRejection::BytesRejection(e) => format!("Failed to read request body: {}", e.body_text()),
            other => other.body_text(),
        };
        ApiError::BadRequest(details)
    }
}
