//! Error types and axum `IntoResponse` implementation.
//!
//! The mapping mirrors the behaviour of the original surfaces: validation
//! problems come back as field-level errors, authorization failures are an
//! explicit 403, and requests that need an account are sent to the login
//! flow rather than erroring.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
}

impl FieldError {
  pub fn new(field: &'static str, message: &str) -> Self {
    Self { field, message: message.to_owned() }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// The request needs an authenticated user; redirect to the login flow.
  #[error("login required")]
  LoginRequired,

  #[error("forbidden")]
  Forbidden,

  #[error("not found")]
  NotFound,

  #[error("validation failed")]
  Validation(Vec<FieldError>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::LoginRequired => Redirect::to("/login").into_response(),
      Error::Forbidden => {
        (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" })))
          .into_response()
      }
      Error::NotFound => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
          .into_response()
      }
      Error::Validation(errors) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "errors": errors })),
      )
        .into_response(),
      Error::Store(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),
    }
  }
}
