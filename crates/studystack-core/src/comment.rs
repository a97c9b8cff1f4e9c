//! Comment — a moderated text note attached to a resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note left on a resource's detail page. Comments are never edited by
/// the application; only the `approved` flag changes, via moderation
/// tooling outside this codebase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:  Uuid,
  pub resource_id: Uuid,
  pub author_id:   Uuid,
  pub body:        String,
  pub approved:    bool,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::StackStore::add_comment`]. New comments always
/// start unapproved; `created_at` is set by the store.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub resource_id: Uuid,
  pub author_id:   Uuid,
  pub body:        String,
}
