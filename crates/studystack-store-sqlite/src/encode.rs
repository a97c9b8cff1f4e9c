//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Booleans are INTEGER 0/1.

use chrono::{DateTime, Utc};
use studystack_core::{
  comment::Comment,
  resource::{Resource, ResourceStatus},
  subject::Subject,
  user::{User, UserRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ResourceStatus ───────────────────────────────────────────────────────────

pub fn encode_status(s: ResourceStatus) -> &'static str {
  match s {
    ResourceStatus::Draft => "draft",
    ResourceStatus::Published => "published",
    ResourceStatus::Withdrawn => "withdrawn",
  }
}

pub fn decode_status(s: &str) -> Result<ResourceStatus> {
  match s {
    "draft" => Ok(ResourceStatus::Draft),
    "published" => Ok(ResourceStatus::Published),
    "withdrawn" => Ok(ResourceStatus::Withdrawn),
    other => {
      Err(studystack_core::Error::UnknownStatus(other.to_owned()).into())
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `resources` row.
pub struct RawResource {
  pub resource_id: String,
  pub title:       String,
  pub slug:        String,
  pub author_id:   String,
  pub description: String,
  pub image:       Option<String>,
  pub link:        Option<String>,
  pub status:      String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawResource {
  pub fn into_resource(self) -> Result<Resource> {
    Ok(Resource {
      resource_id: decode_uuid(&self.resource_id)?,
      title:       self.title,
      slug:        self.slug,
      author_id:   decode_uuid(&self.author_id)?,
      description: self.description,
      image:       self.image,
      link:        self.link,
      status:      decode_status(&self.status)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id: String,
  pub name:       String,
  pub slug:       String,
  pub created_at: String,
}

impl RawSubject {
  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id: decode_uuid(&self.subject_id)?,
      name:       self.name,
      slug:       self.slug,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub comment_id:  String,
  pub resource_id: String,
  pub author_id:   String,
  pub body:        String,
  pub approved:    bool,
  pub created_at:  String,
}

impl RawComment {
  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:  decode_uuid(&self.comment_id)?,
      resource_id: decode_uuid(&self.resource_id)?,
      author_id:   decode_uuid(&self.author_id)?,
      body:        self.body,
      approved:    self.approved,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub password_hash: String,
  pub is_superuser:  bool,
  pub created_at:    String,
}

impl RawUser {
  pub fn into_record(self) -> Result<UserRecord> {
    Ok(UserRecord {
      user: User {
        user_id:      decode_uuid(&self.user_id)?,
        username:     self.username,
        is_superuser: self.is_superuser,
        created_at:   decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }
}
