//! The `StackStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `studystack-store-sqlite`). The HTTP layer depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  comment::{Comment, NewComment},
  page::{Page, PageRequest},
  query::ResourceQuery,
  resource::{NewResource, Resource, ResourceDetail, ResourceUpdate},
  subject::Subject,
  user::{NewUser, User, UserRecord},
};

/// Abstraction over a StudyStack storage backend.
///
/// The slug-uniqueness probe and the free-text subject resolution run inside
/// the backend, within the same logical save as the resource row, so the
/// ordering invariant (resource first, then selections, then free-text
/// subjects) holds per call.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StackStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create and persist an account. The username must be free
  /// (case-insensitive); a clash surfaces as a backend error.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look an account up by username (case-insensitive), with its password
  /// hash, for credential verification. `None` if no such account.
  fn find_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + 'a;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// All subjects, ordered by name.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Retrieve a subject by slug. `None` if not found.
  fn get_subject_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  // ── Resources ─────────────────────────────────────────────────────────

  /// Persist a new resource in one logical save: derive a unique slug from
  /// the title, insert the row, attach the selected subjects, then resolve
  /// and attach the free-text subjects (creating any with no
  /// case-insensitive match). Attachment is idempotent.
  fn create_resource(
    &self,
    input: NewResource,
  ) -> impl Future<Output = Result<Resource, Self::Error>> + Send + '_;

  /// Replace a resource's editable fields and its full subject selection.
  /// The slug, author, and creation timestamp are untouched.
  fn update_resource(
    &self,
    resource_id: Uuid,
    input: ResourceUpdate,
  ) -> impl Future<Output = Result<Resource, Self::Error>> + Send + '_;

  /// Retrieve a resource by slug regardless of status, with its subjects.
  /// Used by the edit and delete surfaces; visibility rules do not apply.
  fn get_resource_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<ResourceDetail>, Self::Error>> + Send + 'a;

  /// Retrieve a *published* resource by slug. Draft and withdrawn
  /// resources yield `None`, the same as an unknown slug.
  fn get_published_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<ResourceDetail>, Self::Error>> + Send + 'a;

  /// One page of published resources matching `query`, newest first.
  fn list_published<'a>(
    &'a self,
    query: &'a ResourceQuery,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<ResourceDetail>, Self::Error>> + Send + 'a;

  /// Delete a resource. Join rows and comments go with it (cascade).
  /// Authorization is the caller's responsibility.
  fn delete_resource(
    &self,
    resource_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Persist a comment. New comments start unapproved.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments on a resource, newest first. With `approved_only`, the
  /// public moderation filter is applied.
  fn comments_for_resource(
    &self,
    resource_id: Uuid,
    approved_only: bool,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;
}
