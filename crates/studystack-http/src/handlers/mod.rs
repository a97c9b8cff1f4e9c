//! Request handlers, one module per view family.

pub mod comments;
pub mod resources;
pub mod subjects;

use axum::{
  http::{HeaderName, HeaderValue},
  response::{IntoResponse, Redirect, Response},
};

/// Flash confirmations ride on redirect responses in this header; the
/// display layer (out of scope here) picks them up.
pub const FLASH_HEADER: HeaderName = HeaderName::from_static("x-flash");

/// 303 See Other with a flash confirmation attached.
pub fn see_other(location: &str, flash: &str) -> Response {
  let mut res = Redirect::to(location).into_response();
  res.headers_mut().insert(
    FLASH_HEADER,
    HeaderValue::from_str(flash)
      .unwrap_or_else(|_| HeaderValue::from_static("")),
  );
  res
}
