//! JSON HTTP layer for StudyStack.
//!
//! Exposes an axum [`Router`] over the resource-sharing surfaces, backed by
//! any [`StackStore`]. Identity is passed explicitly into each handler via
//! extractors; nothing rides on ambient request state.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::get,
};
use studystack_core::{page::PageRequest, store::StackStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{comments, resources, subjects};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_page_size() -> u32 { PageRequest::DEFAULT_SIZE }

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Resources per listing page.
  #[serde(default = "default_page_size")]
  pub page_size:  u32,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: StackStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the StudyStack server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: StackStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/", get(resources::index::<S>))
    .route("/login", get(auth::login_challenge))
    .route(
      "/create/",
      get(resources::create_form::<S>).post(resources::create::<S>),
    )
    .route(
      "/resources/{slug}/",
      get(resources::detail::<S>).post(comments::create::<S>),
    )
    .route(
      "/resources/{slug}/edit/",
      get(resources::edit_form::<S>).post(resources::update::<S>),
    )
    .route(
      "/resources/{slug}/delete/",
      get(resources::delete_redirect).post(resources::delete::<S>),
    )
    .route("/subjects/", get(subjects::index::<S>))
    .route("/subjects/{slug}/", get(subjects::detail::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use studystack_core::{
    resource::{NewResource, ResourceStatus},
    user::NewUser,
  };
  use studystack_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig {
        host:       "127.0.0.1".to_string(),
        port:       0,
        store_path: PathBuf::from(":memory:"),
        page_size:  6,
      }),
    }
  }

  async fn seed_user(
    state: &AppState<SqliteStore>,
    username: &str,
    password: &str,
    is_superuser: bool,
  ) -> Uuid {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    state
      .store
      .add_user(NewUser {
        username: username.to_string(),
        password_hash: hash,
        is_superuser,
      })
      .await
      .unwrap()
      .user_id
  }

  async fn seed_published(
    state: &AppState<SqliteStore>,
    author_id: Uuid,
    title: &str,
    extra_subjects: &str,
  ) -> String {
    let mut input = NewResource::new(author_id, title, "A description");
    input.status = ResourceStatus::Published;
    input.extra_subjects = extra_subjects.to_string();
    state.store.create_resource(input).await.unwrap().slug
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn location(resp: &axum::response::Response) -> &str {
    resp.headers()[header::LOCATION].to_str().unwrap()
  }

  // ── Login flow ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn login_returns_basic_challenge() {
    let state = make_state().await;
    let resp = oneshot(state, "GET", "/login", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  // ── Listing ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn index_lists_published_only() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    seed_published(&state, alice, "Visible", "").await;
    state
      .store
      .create_resource(NewResource::new(alice, "Hidden Draft", "d"))
      .await
      .unwrap();

    let resp = oneshot(state, "GET", "/", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["page"]["total_items"], 1);
    assert_eq!(json["page"]["items"][0]["resource"]["title"], "Visible");
    assert_eq!(json["breadcrumbs"][0]["label"], "Home");
  }

  #[tokio::test]
  async fn index_filters_by_title_substring() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    seed_published(&state, alice, "Linear Algebra", "").await;
    seed_published(&state, alice, "Graph Theory", "").await;

    let resp = oneshot(state, "GET", "/?title=algebra", None, None).await;
    let json = body_json(resp).await;
    assert_eq!(json["page"]["total_items"], 1);
  }

  #[tokio::test]
  async fn index_and_matches_multiple_subjects() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    seed_published(&state, alice, "Both", "Alpha, Beta").await;
    seed_published(&state, alice, "One", "Alpha").await;

    let resp =
      oneshot(state, "GET", "/?subjects=alpha,beta", None, None).await;
    let json = body_json(resp).await;
    assert_eq!(json["page"]["total_items"], 1);
    assert_eq!(json["page"]["items"][0]["resource"]["title"], "Both");
  }

  #[tokio::test]
  async fn repeated_subject_slugs_still_match() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    seed_published(&state, alice, "One", "Alpha").await;

    // A repeated slug must collapse, not double the required link count.
    let resp =
      oneshot(state, "GET", "/?subjects=alpha,alpha", None, None).await;
    let json = body_json(resp).await;
    assert_eq!(json["page"]["total_items"], 1);
    assert_eq!(json["page"]["items"][0]["resource"]["title"], "One");
  }

  // ── Detail ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn detail_of_draft_returns_404() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    let draft = state
      .store
      .create_resource(NewResource::new(alice, "Draft Item", "d"))
      .await
      .unwrap();

    let resp = oneshot(
      state,
      "GET",
      &format!("/resources/{}/", draft.slug),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn detail_of_unknown_slug_returns_404() {
    let state = make_state().await;
    let resp =
      oneshot(state, "GET", "/resources/no-such-thing/", None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Comments ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn anonymous_comment_redirects_to_login_without_a_row() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    let slug = seed_published(&state, alice, "Commented", "").await;

    let resp = oneshot(
      state.clone(),
      "POST",
      &format!("/resources/{slug}/"),
      None,
      Some(serde_json::json!({ "body": "hi" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let detail = state.store.get_published_by_slug(&slug).await.unwrap().unwrap();
    let all = state
      .store
      .comments_for_resource(detail.resource.resource_id, false)
      .await
      .unwrap();
    assert!(all.is_empty());
  }

  #[tokio::test]
  async fn comment_redirects_back_and_awaits_moderation() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    let slug = seed_published(&state, alice, "Commented", "").await;

    let resp = oneshot(
      state.clone(),
      "POST",
      &format!("/resources/{slug}/"),
      Some(&basic("alice", "secret")),
      Some(serde_json::json!({ "body": "Great resource" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/resources/{slug}/"));

    // The comment exists but is not yet publicly visible.
    let detail_resp = oneshot(
      state.clone(),
      "GET",
      &format!("/resources/{slug}/"),
      None,
      None,
    )
    .await;
    let json = body_json(detail_resp).await;
    assert_eq!(json["comments"].as_array().unwrap().len(), 0);

    let detail = state.store.get_published_by_slug(&slug).await.unwrap().unwrap();
    let all = state
      .store
      .comments_for_resource(detail.resource.resource_id, false)
      .await
      .unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].approved);
  }

  #[tokio::test]
  async fn empty_comment_returns_field_errors() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    let slug = seed_published(&state, alice, "Commented", "").await;

    let resp = oneshot(
      state,
      "POST",
      &format!("/resources/{slug}/"),
      Some(&basic("alice", "secret")),
      Some(serde_json::json!({ "body": "   " })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    assert_eq!(json["errors"][0]["field"], "body");
  }

  #[tokio::test]
  async fn overlong_comment_body_is_rejected() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    let slug = seed_published(&state, alice, "Commented", "").await;

    let resp = oneshot(
      state.clone(),
      "POST",
      &format!("/resources/{slug}/"),
      Some(&basic("alice", "secret")),
      Some(serde_json::json!({ "body": "x".repeat(2001) })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    assert_eq!(json["errors"][0]["field"], "body");

    let detail = state.store.get_published_by_slug(&slug).await.unwrap().unwrap();
    let all = state
      .store
      .comments_for_resource(detail.resource.resource_id, false)
      .await
      .unwrap();
    assert!(all.is_empty());
  }

  // ── Create ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_requires_login() {
    let state = make_state().await;
    let resp = oneshot(
      state,
      "POST",
      "/create/",
      None,
      Some(serde_json::json!({ "title": "T", "description": "D" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
  }

  #[tokio::test]
  async fn create_validates_fields() {
    let state = make_state().await;
    seed_user(&state, "alice", "secret", false).await;

    let resp = oneshot(
      state,
      "POST",
      "/create/",
      Some(&basic("alice", "secret")),
      Some(serde_json::json!({
        "title": "  ",
        "description": "",
        "link": "not-a-url"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    let fields: Vec<&str> = json["errors"]
      .as_array()
      .unwrap()
      .iter()
      .map(|e| e["field"].as_str().unwrap())
      .collect();
    assert_eq!(fields, &["title", "description", "link"]);
  }

  #[tokio::test]
  async fn overlong_title_is_rejected() {
    let state = make_state().await;
    seed_user(&state, "alice", "secret", false).await;

    let resp = oneshot(
      state,
      "POST",
      "/create/",
      Some(&basic("alice", "secret")),
      Some(serde_json::json!({
        "title": "x".repeat(201),
        "description": "D"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    assert_eq!(json["errors"][0]["field"], "title");
  }

  #[tokio::test]
  async fn bare_scheme_link_is_rejected() {
    let state = make_state().await;
    seed_user(&state, "alice", "secret", false).await;

    for link in ["http://", "https://", "https:// bad"] {
      let resp = oneshot(
        state.clone(),
        "POST",
        "/create/",
        Some(&basic("alice", "secret")),
        Some(serde_json::json!({
          "title": "T",
          "description": "D",
          "link": link
        })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
      let json = body_json(resp).await;
      assert_eq!(json["errors"][0]["field"], "link");
    }
  }

  #[tokio::test]
  async fn create_merges_selected_and_free_text_subjects() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;

    // Seed the "AI" subject through an earlier resource.
    seed_published(&state, alice, "Seed", "AI").await;
    let ai = state
      .store
      .list_subjects()
      .await
      .unwrap()
      .into_iter()
      .find(|s| s.name == "AI")
      .unwrap();

    let resp = oneshot(
      state.clone(),
      "POST",
      "/create/",
      Some(&basic("alice", "secret")),
      Some(serde_json::json!({
        "title": "Intro to ML",
        "description": "Getting started",
        "status": "published",
        "subject_ids": [ai.subject_id],
        "extra_subjects": "Python, ai"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/resources/intro-to-ml/");

    let detail_resp =
      oneshot(state, "GET", "/resources/intro-to-ml/", None, None).await;
    let json = body_json(detail_resp).await;
    let names: Vec<&str> = json["subjects"]
      .as_array()
      .unwrap()
      .iter()
      .map(|s| s["name"].as_str().unwrap())
      .collect();
    assert_eq!(names, &["AI", "Python"]);
  }

  // ── Edit ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn edit_by_stranger_is_forbidden() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    seed_user(&state, "bob", "hunter2", false).await;
    let slug = seed_published(&state, alice, "Owned", "").await;

    let resp = oneshot(
      state,
      "GET",
      &format!("/resources/{slug}/edit/"),
      Some(&basic("bob", "hunter2")),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn update_changes_title_but_keeps_slug() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    let slug = seed_published(&state, alice, "Old Title", "").await;

    let resp = oneshot(
      state.clone(),
      "POST",
      &format!("/resources/{slug}/edit/"),
      Some(&basic("alice", "secret")),
      Some(serde_json::json!({
        "title": "New Title",
        "description": "Still useful",
        "status": "published"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let detail_resp = oneshot(
      state,
      "GET",
      &format!("/resources/{slug}/"),
      None,
      None,
    )
    .await;
    let json = body_json(detail_resp).await;
    assert_eq!(json["resource"]["title"], "New Title");
    assert_eq!(json["resource"]["slug"], slug);
  }

  // ── Delete ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_get_is_a_noop_redirect() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    let slug = seed_published(&state, alice, "Kept", "").await;

    let resp = oneshot(
      state.clone(),
      "GET",
      &format!("/resources/{slug}/delete/"),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    assert!(state.store.get_published_by_slug(&slug).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn delete_by_stranger_is_forbidden() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    seed_user(&state, "bob", "hunter2", false).await;
    let slug = seed_published(&state, alice, "Contested", "").await;

    let resp = oneshot(
      state.clone(),
      "POST",
      &format!("/resources/{slug}/delete/"),
      Some(&basic("bob", "hunter2")),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    assert!(state.store.get_published_by_slug(&slug).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn delete_by_anonymous_is_forbidden() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    let slug = seed_published(&state, alice, "Contested", "").await;

    let resp = oneshot(
      state.clone(),
      "POST",
      &format!("/resources/{slug}/delete/"),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn delete_by_author_removes_the_resource() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    let slug = seed_published(&state, alice, "Doomed", "Chemistry").await;

    let resp = oneshot(
      state.clone(),
      "POST",
      &format!("/resources/{slug}/delete/"),
      Some(&basic("alice", "secret")),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let detail_resp = oneshot(
      state,
      "GET",
      &format!("/resources/{slug}/"),
      None,
      None,
    )
    .await;
    assert_eq!(detail_resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn delete_by_superuser_is_allowed() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    seed_user(&state, "admin", "adminpass", true).await;
    let slug = seed_published(&state, alice, "Moderated Away", "").await;

    let resp = oneshot(
      state.clone(),
      "POST",
      &format!("/resources/{slug}/delete/"),
      Some(&basic("admin", "adminpass")),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    assert!(state.store.get_resource_by_slug(&slug).await.unwrap().is_none());
  }

  // ── Subjects ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn subject_page_lists_linked_published_resources() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", "secret", false).await;
    seed_published(&state, alice, "Tagged", "Physics").await;
    seed_published(&state, alice, "Untagged", "").await;

    let resp =
      oneshot(state.clone(), "GET", "/subjects/physics/", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["subject"]["name"], "Physics");
    assert_eq!(json["page"]["total_items"], 1);

    let missing =
      oneshot(state, "GET", "/subjects/nope/", None, None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
  }
}
