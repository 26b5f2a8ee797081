//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Resolver(#[from] tether_core::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::BadRequest(message) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
      }
      ApiError::Resolver(e @ tether_core::Error::MissingIdentifier) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
          .into_response()
      }
      ApiError::Resolver(e) => {
        tracing::error!(error = %e, "identify failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({
            "error": "Internal server error",
            "message": e.to_string(),
          })),
        )
          .into_response()
      }
    }
  }
}
