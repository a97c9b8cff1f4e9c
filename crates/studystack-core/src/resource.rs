//! Resource — a shared educational item and its input/read models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::Subject;

/// Publication state. Only `Published` resources are visible through the
/// list and detail surfaces; the other two return not-found to everyone.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
  #[default]
  Draft,
  Published,
  Withdrawn,
}

/// A shared educational item authored by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
  pub resource_id: Uuid,
  pub title:       String,
  /// Unique, non-empty, derived from the title at creation and stable
  /// thereafter.
  pub slug:        String,
  pub author_id:   Uuid,
  pub description: String,
  /// Opaque path or URL into the external image storage provider.
  pub image:       Option<String>,
  pub link:        Option<String>,
  pub status:      ResourceStatus,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// A resource bundled with its linked subjects — the read model served by
/// list and detail surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDetail {
  pub resource: Resource,
  pub subjects: Vec<Subject>,
}

/// Input to [`crate::store::StackStore::create_resource`].
///
/// `subject_ids` are the already-existing selections; `extra_subjects` is
/// the raw free-text field, resolved per the rules in [`crate::subject`].
/// The slug and both timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewResource {
  pub author_id:      Uuid,
  pub title:          String,
  pub description:    String,
  pub image:          Option<String>,
  pub link:           Option<String>,
  pub status:         ResourceStatus,
  pub subject_ids:    Vec<Uuid>,
  pub extra_subjects: String,
}

impl NewResource {
  /// Convenience constructor with all optional fields at their defaults.
  pub fn new(author_id: Uuid, title: &str, description: &str) -> Self {
    Self {
      author_id,
      title: title.to_owned(),
      description: description.to_owned(),
      image: None,
      link: None,
      status: ResourceStatus::default(),
      subject_ids: Vec::new(),
      extra_subjects: String::new(),
    }
  }
}

/// Input to [`crate::store::StackStore::update_resource`]. Replaces the
/// editable fields and the full subject selection; the slug, author, and
/// `created_at` are untouched, and `updated_at` is reset by the store.
#[derive(Debug, Clone)]
pub struct ResourceUpdate {
  pub title:          String,
  pub description:    String,
  pub image:          Option<String>,
  pub link:           Option<String>,
  pub status:         ResourceStatus,
  pub subject_ids:    Vec<Uuid>,
  pub extra_subjects: String,
}
