//! Comment submission on the resource detail path.

use axum::{
  Json,
  extract::{Path, State},
  response::Response,
};
use serde::Deserialize;
use studystack_core::{comment::NewComment, store::StackStore};

use crate::{
  AppState,
  auth::CurrentUser,
  error::{Error, FieldError},
  handlers::see_other,
};

const BODY_MAX: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct CommentForm {
  pub body: String,
}

impl CommentForm {
  fn validate(&self) -> Result<(), Error> {
    let mut errors = Vec::new();

    if self.body.trim().is_empty() {
      errors.push(FieldError::new("body", "this field is required"));
    } else if self.body.chars().count() > BODY_MAX {
      errors.push(FieldError::new("body", "2000 characters maximum"));
    }

    if errors.is_empty() { Ok(()) } else { Err(Error::Validation(errors)) }
  }
}

/// `POST /resources/{slug}/` — leave a comment, then redirect back to the
/// same detail page so a refresh cannot double-submit. Anonymous posters
/// are sent to the login flow by the [`CurrentUser`] extractor.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  user: CurrentUser,
  Json(form): Json<CommentForm>,
) -> Result<Response, Error>
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  let detail = state
    .store
    .get_published_by_slug(&slug)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  form.validate()?;

  state
    .store
    .add_comment(NewComment {
      resource_id: detail.resource.resource_id,
      author_id:   user.user_id,
      body:        form.body.trim().to_owned(),
    })
    .await
    .map_err(Error::store)?;

  Ok(see_other(
    &format!("/resources/{slug}/"),
    "Comment submitted for review.",
  ))
}
