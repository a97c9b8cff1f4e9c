//! User — the account that authors resources and comments.
//!
//! Authentication itself (password hashing, credential checks) lives in the
//! HTTP layer; the store only persists the argon2 PHC string alongside the
//! account row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. The password hash never leaves the store layer in
/// this shape — handlers see [`User`], the auth path sees [`UserRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  /// Unique, compared case-insensitively.
  pub username:     String,
  pub is_superuser: bool,
  pub created_at:   DateTime<Utc>,
}

/// A [`User`] bundled with its argon2 PHC string, for credential checks.
#[derive(Debug, Clone)]
pub struct UserRecord {
  pub user:          User,
  pub password_hash: String,
}

/// Input to [`crate::store::StackStore::add_user`].
/// `created_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  /// Argon2 PHC string, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub is_superuser:  bool,
}
