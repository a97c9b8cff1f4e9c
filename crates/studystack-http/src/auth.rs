//! HTTP Basic-auth against accounts in the store, plus the login-flow
//! endpoint unauthenticated requests are redirected to.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Json,
  extract::FromRequestParts,
  http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde_json::json;
use studystack_core::store::StackStore;
use uuid::Uuid;

use crate::{AppState, error::Error};

/// The authenticated identity threaded explicitly into handlers — never
/// ambient state.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub user_id:      Uuid,
  pub username:     String,
  pub is_superuser: bool,
}

impl CurrentUser {
  /// Owner-or-superuser rule shared by the edit and delete surfaces.
  pub fn may_manage(&self, author_id: Uuid) -> bool {
    self.is_superuser || self.user_id == author_id
  }
}

/// Like [`CurrentUser`] but never rejects; anonymous and bad-credential
/// requests extract as `None`. The delete surface uses this so it can
/// answer 403 instead of bouncing to the login flow.
pub struct MaybeUser(pub Option<CurrentUser>);

/// Verify Basic credentials against the `users` table.
pub async fn verify_credentials<S>(
  headers: &HeaderMap,
  store: &S,
) -> Result<CurrentUser, Error>
where
  S: StackStore,
{
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::LoginRequired)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::LoginRequired)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::LoginRequired)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::LoginRequired)?;

  let (username, password) =
    creds.split_once(':').ok_or(Error::LoginRequired)?;

  let record = store
    .find_user(username)
    .await
    .map_err(Error::store)?
    .ok_or(Error::LoginRequired)?;

  let parsed_hash = PasswordHash::new(&record.password_hash)
    .map_err(|_| Error::LoginRequired)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::LoginRequired)?;

  Ok(CurrentUser {
    user_id:      record.user.user_id,
    username:     record.user.username,
    is_superuser: record.user.is_superuser,
  })
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_credentials(&parts.headers, state.store.as_ref()).await
  }
}

impl<S> FromRequestParts<AppState<S>> for MaybeUser
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = verify_credentials(&parts.headers, state.store.as_ref())
      .await
      .ok();
    Ok(MaybeUser(user))
  }
}

/// `GET /login` — the login flow. With Basic auth this is simply a 401
/// challenge; the browser (or client) retries with credentials.
pub async fn login_challenge() -> Response {
  let mut res = (
    StatusCode::UNAUTHORIZED,
    Json(json!({ "detail": "authentication required" })),
  )
    .into_response();
  res.headers_mut().insert(
    header::WWW_AUTHENTICATE,
    HeaderValue::from_static("Basic realm=\"studystack\""),
  );
  res
}
