//! Handlers for the subject surfaces.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use studystack_core::{
  breadcrumb::{Crumb, Trail},
  page::{Page, PageRequest},
  query::ResourceQuery,
  resource::ResourceDetail,
  store::StackStore,
  subject::Subject,
};

use crate::{AppState, error::Error};

#[derive(Debug, Serialize)]
pub struct SubjectListResponse {
  pub subjects:    Vec<Subject>,
  pub breadcrumbs: Vec<Crumb>,
}

/// `GET /subjects/` — every subject, alphabetical.
pub async fn index<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<SubjectListResponse>, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let subjects = state.store.list_subjects().await.map_err(Error::store)?;

  Ok(Json(SubjectListResponse {
    subjects,
    breadcrumbs: Trail::root().push("Subjects", "/subjects/").into_crumbs(),
  }))
}

#[derive(Debug, Deserialize, Default)]
pub struct SubjectPageParams {
  pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SubjectDetailResponse {
  pub subject:     Subject,
  pub page:        Page<ResourceDetail>,
  pub breadcrumbs: Vec<Crumb>,
}

/// `GET /subjects/{slug}/` — published resources linked to one subject.
pub async fn detail<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  Query(params): Query<SubjectPageParams>,
) -> Result<Json<SubjectDetailResponse>, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let subject = state
    .store
    .get_subject_by_slug(&slug)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  let query = ResourceQuery {
    subject_slugs: vec![subject.slug.clone()],
    ..Default::default()
  };
  let request =
    PageRequest::new(params.page.unwrap_or(1), state.config.page_size);

  let page = state
    .store
    .list_published(&query, request)
    .await
    .map_err(Error::store)?;

  let breadcrumbs = Trail::root()
    .push("Subjects", "/subjects/")
    .push(&subject.name, &format!("/subjects/{slug}/"))
    .into_crumbs();

  Ok(Json(SubjectDetailResponse { subject, page, breadcrumbs }))
}
