//! Handlers for the resource surfaces.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | published list; `title`, `subject`, `subjects`, `created`, `page` |
//! | `GET`  | `/resources/{slug}/` | detail + approved comments |
//! | `GET`/`POST` | `/create/` | creation form scaffold / submit |
//! | `GET`/`POST` | `/resources/{slug}/edit/` | edit form / submit |
//! | `GET`/`POST` | `/resources/{slug}/delete/` | no-op redirect / delete |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use studystack_core::{
  breadcrumb::{Crumb, Trail},
  comment::Comment,
  page::{Page, PageRequest},
  query::{CreatedRange, ResourceQuery},
  resource::{
    NewResource, Resource, ResourceDetail, ResourceStatus, ResourceUpdate,
  },
  store::StackStore,
  subject::Subject,
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{CurrentUser, MaybeUser},
  error::{Error, FieldError},
  handlers::see_other,
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Case-insensitive title substring.
  pub title:   Option<String>,
  /// Case-insensitive subject-name substring.
  pub subject: Option<String>,
  /// Comma-separated subject slugs; resources must match all of them.
  pub subjects: Option<String>,
  pub created: Option<CreatedRange>,
  pub page:    Option<u32>,
}

impl ListParams {
  pub fn into_query(self) -> (ResourceQuery, u32) {
    let query = ResourceQuery {
      title:         self.title.filter(|t| !t.trim().is_empty()),
      subject:       self.subject.filter(|s| !s.trim().is_empty()),
      subject_slugs: self
        .subjects
        .map(|s| {
          // Dedupe: a repeated slug must not inflate the AND-match count.
          let mut slugs: Vec<String> = Vec::new();
          for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if !slugs.iter().any(|seen| seen == part) {
              slugs.push(part.to_owned());
            }
          }
          slugs
        })
        .unwrap_or_default(),
      created:       self.created,
    };
    (query, self.page.unwrap_or(1))
  }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub page:        Page<ResourceDetail>,
  pub breadcrumbs: Vec<Crumb>,
}

/// `GET /` — paginated published resources.
pub async fn index<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let (query, page_number) = params.into_query();
  let request = PageRequest::new(page_number, state.config.page_size);

  let page = state
    .store
    .list_published(&query, request)
    .await
    .map_err(Error::store)?;

  Ok(Json(ListResponse {
    page,
    breadcrumbs: Trail::root().into_crumbs(),
  }))
}

// ─── Detail ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DetailResponse {
  pub resource:    Resource,
  pub subjects:    Vec<Subject>,
  pub comments:    Vec<Comment>,
  pub breadcrumbs: Vec<Crumb>,
}

/// `GET /resources/{slug}/` — published detail with approved comments.
pub async fn detail<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
) -> Result<Json<DetailResponse>, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let detail = state
    .store
    .get_published_by_slug(&slug)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  let comments = state
    .store
    .comments_for_resource(detail.resource.resource_id, true)
    .await
    .map_err(Error::store)?;

  let breadcrumbs = Trail::root()
    .push(&detail.resource.title, &format!("/resources/{slug}/"))
    .into_crumbs();

  Ok(Json(DetailResponse {
    resource: detail.resource,
    subjects: detail.subjects,
    comments,
    breadcrumbs,
  }))
}

// ─── Create / edit forms ──────────────────────────────────────────────────────

/// The creation and edit surfaces both submit this shape; subject selection
/// is split between ids of existing subjects and the free-text field.
#[derive(Debug, Deserialize)]
pub struct ResourceForm {
  pub title:       String,
  pub description: String,
  #[serde(default)]
  pub image:          Option<String>,
  #[serde(default)]
  pub link:           Option<String>,
  #[serde(default)]
  pub status:         ResourceStatus,
  #[serde(default)]
  pub subject_ids:    Vec<Uuid>,
  #[serde(default)]
  pub extra_subjects: String,
}

const TITLE_MAX: usize = 200;

/// An absolute `http(s)` URL needs a scheme and a non-empty host.
fn is_http_url(link: &str) -> bool {
  let Some(rest) = link
    .strip_prefix("http://")
    .or_else(|| link.strip_prefix("https://"))
  else {
    return false;
  };
  let host = rest.split(['/', '?', '#']).next().unwrap_or("");
  !host.is_empty() && !host.contains(char::is_whitespace)
}

impl ResourceForm {
  /// Field-level validation; all failures are reported at once.
  fn validate(&self) -> Result<(), Error> {
    let mut errors = Vec::new();

    if self.title.trim().is_empty() {
      errors.push(FieldError::new("title", "this field is required"));
    } else if self.title.chars().count() > TITLE_MAX {
      errors.push(FieldError::new("title", "200 characters maximum"));
    }

    if self.description.trim().is_empty() {
      errors.push(FieldError::new("description", "this field is required"));
    }

    if let Some(link) = self.link.as_deref()
      && !link.trim().is_empty()
      && !is_http_url(link.trim())
    {
      errors.push(FieldError::new("link", "must be an http(s) URL"));
    }

    if errors.is_empty() { Ok(()) } else { Err(Error::Validation(errors)) }
  }

  fn normalized_link(&self) -> Option<String> {
    self
      .link
      .as_deref()
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .map(str::to_owned)
  }

  fn normalized_image(&self) -> Option<String> {
    self
      .image
      .as_deref()
      .map(str::trim)
      .filter(|i| !i.is_empty())
      .map(str::to_owned)
  }
}

#[derive(Debug, Serialize)]
pub struct CreateFormResponse {
  /// Options for the subject multi-select.
  pub subject_options: Vec<Subject>,
  pub breadcrumbs:     Vec<Crumb>,
}

/// `GET /create/` — form scaffold for authenticated users.
pub async fn create_form<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
) -> Result<Json<CreateFormResponse>, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let subject_options =
    state.store.list_subjects().await.map_err(Error::store)?;

  Ok(Json(CreateFormResponse {
    subject_options,
    breadcrumbs: Trail::root().push("Share a resource", "/create/").into_crumbs(),
  }))
}

/// `POST /create/` — create a resource, then redirect to its detail page.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(form): Json<ResourceForm>,
) -> Result<axum::response::Response, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  form.validate()?;

  let resource = state
    .store
    .create_resource(NewResource {
      author_id:      user.user_id,
      title:          form.title.trim().to_owned(),
      description:    form.description.clone(),
      image:          form.normalized_image(),
      link:           form.normalized_link(),
      status:         form.status,
      subject_ids:    form.subject_ids.clone(),
      extra_subjects: form.extra_subjects.clone(),
    })
    .await
    .map_err(Error::store)?;

  tracing::info!(slug = %resource.slug, author = %user.username, "resource created");

  Ok(see_other(
    &format!("/resources/{}/", resource.slug),
    "Resource created.",
  ))
}

#[derive(Debug, Serialize)]
pub struct EditFormResponse {
  pub resource:        Resource,
  pub subjects:        Vec<Subject>,
  pub subject_options: Vec<Subject>,
  pub breadcrumbs:     Vec<Crumb>,
}

/// `GET /resources/{slug}/edit/` — current values for the edit form.
pub async fn edit_form<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  user: CurrentUser,
) -> Result<Json<EditFormResponse>, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let detail = fetch_managed(&state, &slug, &user).await?;
  let subject_options =
    state.store.list_subjects().await.map_err(Error::store)?;

  let breadcrumbs = Trail::root()
    .push(&detail.resource.title, &format!("/resources/{slug}/"))
    .push("Edit", &format!("/resources/{slug}/edit/"))
    .into_crumbs();

  Ok(Json(EditFormResponse {
    resource: detail.resource,
    subjects: detail.subjects,
    subject_options,
    breadcrumbs,
  }))
}

/// `POST /resources/{slug}/edit/` — apply an update, redirect to detail.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  user: CurrentUser,
  Json(form): Json<ResourceForm>,
) -> Result<axum::response::Response, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let detail = fetch_managed(&state, &slug, &user).await?;
  form.validate()?;

  state
    .store
    .update_resource(detail.resource.resource_id, ResourceUpdate {
      title:          form.title.trim().to_owned(),
      description:    form.description.clone(),
      image:          form.normalized_image(),
      link:           form.normalized_link(),
      status:         form.status,
      subject_ids:    form.subject_ids.clone(),
      extra_subjects: form.extra_subjects.clone(),
    })
    .await
    .map_err(Error::store)?;

  Ok(see_other(&format!("/resources/{slug}/"), "Resource updated."))
}

/// Fetch a resource regardless of status and enforce the owner-or-superuser
/// rule shared by the edit surfaces.
async fn fetch_managed<S>(
  state: &AppState<S>,
  slug: &str,
  user: &CurrentUser,
) -> Result<ResourceDetail, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let detail = state
    .store
    .get_resource_by_slug(slug)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  if !user.may_manage(detail.resource.author_id) {
    return Err(Error::Forbidden);
  }
  Ok(detail)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `GET /resources/{slug}/delete/` — a plain fetch never deletes; bounce
/// back to the listing.
pub async fn delete_redirect() -> axum::response::Redirect {
  axum::response::Redirect::to("/")
}

/// `POST /resources/{slug}/delete/` — author or superuser only; everyone
/// else, authenticated or not, gets 403.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  MaybeUser(user): MaybeUser,
) -> Result<axum::response::Response, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let detail = state
    .store
    .get_resource_by_slug(&slug)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  let allowed = user
    .as_ref()
    .is_some_and(|u| u.may_manage(detail.resource.author_id));
  if !allowed {
    return Err(Error::Forbidden);
  }

  state
    .store
    .delete_resource(detail.resource.resource_id)
    .await
    .map_err(Error::store)?;

  tracing::info!(slug = %slug, "resource deleted");

  Ok(see_other("/", "Resource deleted."))
}
