//! [`SqliteStore`] — the SQLite implementation of [`StackStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use studystack_core::{
  comment::{Comment, NewComment},
  page::{Page, PageRequest},
  query::ResourceQuery,
  resource::{NewResource, Resource, ResourceDetail, ResourceUpdate},
  slug,
  store::StackStore,
  subject::{self, Subject},
  user::{NewUser, User, UserRecord},
};

use crate::{
  Error, Result,
  encode::{
    RawComment, RawResource, RawSubject, RawUser, encode_dt, encode_status,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A StudyStack store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Connection-local helpers ────────────────────────────────────────────────
//
// These run inside `conn.call` closures, so they work with plain
// `rusqlite::Result` and never touch the async runtime.

/// `?,?,…` for a dynamic `IN` list.
fn placeholders(n: usize) -> String {
  std::iter::repeat_n("?", n).collect::<Vec<_>>().join(",")
}

/// Probe slug candidates (`base`, `base-2`, …) against `table` until one is
/// free; one existence check per attempt, no upper bound.
fn unique_slug(
  conn: &rusqlite::Connection,
  table: &'static str,
  base: &str,
) -> rusqlite::Result<String> {
  let sql = format!("SELECT 1 FROM {table} WHERE slug = ?1");
  let mut stmt = conn.prepare(&sql)?;

  for candidate in slug::candidates(base) {
    let taken: bool = stmt
      .query_row(rusqlite::params![candidate], |_| Ok(true))
      .optional()?
      .unwrap_or(false);
    if !taken {
      return Ok(candidate);
    }
  }
  unreachable!("slug candidate sequence is infinite");
}

/// Idempotent join-table attach; re-attaching an already-linked subject is a
/// no-op thanks to the pair-unique constraint.
fn attach_subject(
  conn: &rusqlite::Connection,
  resource_id: &str,
  subject_id: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO resource_subjects (resource_id, subject_id)
     VALUES (?1, ?2)",
    rusqlite::params![resource_id, subject_id],
  )?;
  Ok(())
}

/// Names of the subjects in `subject_ids`, for the case-insensitive merge
/// with the free-text field.
fn subject_names_by_id(
  conn: &rusqlite::Connection,
  subject_ids: &[String],
) -> rusqlite::Result<Vec<String>> {
  if subject_ids.is_empty() {
    return Ok(Vec::new());
  }
  let sql = format!(
    "SELECT name FROM subjects WHERE subject_id IN ({})",
    placeholders(subject_ids.len())
  );
  let mut stmt = conn.prepare(&sql)?;
  let names = stmt
    .query_map(rusqlite::params_from_iter(subject_ids), |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(names)
}

/// Resolve free-text names into subject ids: one case-insensitive batch
/// lookup (the `name` column collates NOCASE), then a create for every name
/// with no match, slug derived per the usual probe.
fn resolve_subject_names(
  conn: &rusqlite::Connection,
  names: &[String],
) -> rusqlite::Result<Vec<String>> {
  if names.is_empty() {
    return Ok(Vec::new());
  }

  let sql = format!(
    "SELECT subject_id, name FROM subjects WHERE name IN ({})",
    placeholders(names.len())
  );
  let mut stmt = conn.prepare(&sql)?;
  let existing: Vec<(String, String)> = stmt
    .query_map(rusqlite::params_from_iter(names), |row| {
      Ok((row.get(0)?, row.get(1)?))
    })?
    .collect::<rusqlite::Result<_>>()?;

  let mut ids = Vec::with_capacity(names.len());
  for name in names {
    let found = existing
      .iter()
      .find(|(_, n)| n.eq_ignore_ascii_case(name))
      .map(|(id, _)| id.clone());

    let id = match found {
      Some(id) => id,
      None => {
        let id = encode_uuid(Uuid::new_v4());
        let slug = unique_slug(conn, "subjects", &slug::slugify(name, "subject"))?;
        conn.execute(
          "INSERT INTO subjects (subject_id, name, slug, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id, name, slug, encode_dt(Utc::now())],
        )?;
        id
      }
    };
    ids.push(id);
  }

  Ok(ids)
}

/// Attach the selected subject ids, then resolve and attach the free-text
/// names (minus any covered by the selections). Order matters: the resource
/// row must already exist when this runs.
fn attach_all_subjects(
  conn: &rusqlite::Connection,
  resource_id: &str,
  subject_ids: &[String],
  extra_subjects: &str,
) -> rusqlite::Result<()> {
  for sid in subject_ids {
    attach_subject(conn, resource_id, sid)?;
  }

  let selected_names = subject_names_by_id(conn, subject_ids)?;
  let to_resolve = subject::merge_free_text(extra_subjects, &selected_names);
  for sid in resolve_subject_names(conn, &to_resolve)? {
    attach_subject(conn, resource_id, &sid)?;
  }

  Ok(())
}

fn subjects_for_resource(
  conn: &rusqlite::Connection,
  resource_id: &str,
) -> rusqlite::Result<Vec<RawSubject>> {
  let mut stmt = conn.prepare(
    "SELECT s.subject_id, s.name, s.slug, s.created_at
     FROM subjects s
     JOIN resource_subjects rs ON rs.subject_id = s.subject_id
     WHERE rs.resource_id = ?1
     ORDER BY s.name",
  )?;
  stmt
    .query_map(rusqlite::params![resource_id], |row| {
      Ok(RawSubject {
        subject_id: row.get(0)?,
        name:       row.get(1)?,
        slug:       row.get(2)?,
        created_at: row.get(3)?,
      })
    })?
    .collect()
}

const RESOURCE_COLUMNS: &str = "r.resource_id, r.title, r.slug, r.author_id, \
   r.description, r.image, r.link, r.status, r.created_at, r.updated_at";

fn raw_resource_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawResource> {
  Ok(RawResource {
    resource_id: row.get(0)?,
    title:       row.get(1)?,
    slug:        row.get(2)?,
    author_id:   row.get(3)?,
    description: row.get(4)?,
    image:       row.get(5)?,
    link:        row.get(6)?,
    status:      row.get(7)?,
    created_at:  row.get(8)?,
    updated_at:  row.get(9)?,
  })
}

fn resource_with_subjects(
  conn: &rusqlite::Connection,
  slug: &str,
  published_only: bool,
) -> rusqlite::Result<Option<(RawResource, Vec<RawSubject>)>> {
  let sql = if published_only {
    format!(
      "SELECT {RESOURCE_COLUMNS} FROM resources r
       WHERE r.slug = ?1 AND r.status = 'published'"
    )
  } else {
    format!("SELECT {RESOURCE_COLUMNS} FROM resources r WHERE r.slug = ?1")
  };

  let raw = conn
    .query_row(&sql, rusqlite::params![slug], raw_resource_from_row)
    .optional()?;

  match raw {
    Some(raw) => {
      let subjects = subjects_for_resource(conn, &raw.resource_id)?;
      Ok(Some((raw, subjects)))
    }
    None => Ok(None),
  }
}

fn decode_detail(
  (raw, raw_subjects): (RawResource, Vec<RawSubject>),
) -> Result<ResourceDetail> {
  Ok(ResourceDetail {
    resource: raw.into_resource()?,
    subjects: raw_subjects
      .into_iter()
      .map(RawSubject::into_subject)
      .collect::<Result<Vec<Subject>>>()?,
  })
}

// ─── StackStore impl ─────────────────────────────────────────────────────────

impl StackStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:      Uuid::new_v4(),
      username:     input.username,
      is_superuser: input.is_superuser,
      created_at:   Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let hash     = input.password_hash;
    let at_str   = encode_dt(user.created_at);
    let is_super = user.is_superuser;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, password_hash, is_superuser, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, username, hash, is_super, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, username, password_hash, is_superuser, created_at
               FROM users WHERE username = ?1",
              rusqlite::params![username],
              |row| {
                Ok(RawUser {
                  user_id:       row.get(0)?,
                  username:      row.get(1)?,
                  password_hash: row.get(2)?,
                  is_superuser:  row.get(3)?,
                  created_at:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_record).transpose()
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_id, name, slug, created_at FROM subjects ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSubject {
              subject_id: row.get(0)?,
              name:       row.get(1)?,
              slug:       row.get(2)?,
              created_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn get_subject_by_slug(&self, slug: &str) -> Result<Option<Subject>> {
    let slug = slug.to_owned();

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT subject_id, name, slug, created_at FROM subjects WHERE slug = ?1",
              rusqlite::params![slug],
              |row| {
                Ok(RawSubject {
                  subject_id: row.get(0)?,
                  name:       row.get(1)?,
                  slug:       row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  // ── Resources ─────────────────────────────────────────────────────────────

  async fn create_resource(&self, input: NewResource) -> Result<Resource> {
    let resource_id = Uuid::new_v4();
    let now = Utc::now();

    let id_str      = encode_uuid(resource_id);
    let author_str  = encode_uuid(input.author_id);
    let title       = input.title.clone();
    let description = input.description;
    let image       = input.image;
    let link        = input.link;
    let status_str  = encode_status(input.status).to_owned();
    let at_str      = encode_dt(now);
    let base        = slug::slugify(&input.title, "resource");
    let subject_ids: Vec<String> =
      input.subject_ids.iter().copied().map(encode_uuid).collect();
    let extra = input.extra_subjects;

    // One logical save: resource row, then selections, then free text.
    // A single transaction, so a failure mid-attach leaves nothing behind.
    let assigned_slug: String = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let slug = unique_slug(&tx, "resources", &base)?;
        tx.execute(
          "INSERT INTO resources (
             resource_id, title, slug, author_id, description,
             image, link, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str, title, slug, author_str, description,
            image, link, status_str, at_str, at_str,
          ],
        )?;
        attach_all_subjects(&tx, &id_str, &subject_ids, &extra)?;
        tx.commit()?;
        Ok(slug)
      })
      .await?;

    // Re-read so the returned value reflects exactly what was persisted.
    let detail = self
      .get_resource_by_slug(&assigned_slug)
      .await?
      .ok_or(Error::ResourceNotFound(resource_id))?;
    Ok(detail.resource)
  }

  async fn update_resource(
    &self,
    resource_id: Uuid,
    input: ResourceUpdate,
  ) -> Result<Resource> {
    let id_str      = encode_uuid(resource_id);
    let title       = input.title;
    let description = input.description;
    let image       = input.image;
    let link        = input.link;
    let status_str  = encode_status(input.status).to_owned();
    let at_str      = encode_dt(Utc::now());
    let subject_ids: Vec<String> =
      input.subject_ids.iter().copied().map(encode_uuid).collect();
    let extra = input.extra_subjects;

    let raw: Option<RawResource> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE resources
           SET title = ?2, description = ?3, image = ?4, link = ?5,
               status = ?6, updated_at = ?7
           WHERE resource_id = ?1",
          rusqlite::params![
            id_str, title, description, image, link, status_str, at_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        // The edit form resubmits the full selection: replace the set, then
        // run the same attach path as creation.
        tx.execute(
          "DELETE FROM resource_subjects WHERE resource_id = ?1",
          rusqlite::params![id_str],
        )?;
        attach_all_subjects(&tx, &id_str, &subject_ids, &extra)?;

        let sql = format!(
          "SELECT {RESOURCE_COLUMNS} FROM resources r WHERE r.resource_id = ?1"
        );
        let raw = tx
          .query_row(&sql, rusqlite::params![id_str], raw_resource_from_row)
          .optional()?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw
      .ok_or(Error::ResourceNotFound(resource_id))?
      .into_resource()
  }

  async fn get_resource_by_slug(
    &self,
    slug: &str,
  ) -> Result<Option<ResourceDetail>> {
    let slug = slug.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(resource_with_subjects(conn, &slug, false)?))
      .await?;
    raw.map(decode_detail).transpose()
  }

  async fn get_published_by_slug(
    &self,
    slug: &str,
  ) -> Result<Option<ResourceDetail>> {
    let slug = slug.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(resource_with_subjects(conn, &slug, true)?))
      .await?;
    raw.map(decode_detail).transpose()
  }

  async fn list_published(
    &self,
    query: &ResourceQuery,
    page: PageRequest,
  ) -> Result<Page<ResourceDetail>> {
    // Build the WHERE clause dynamically, one condition per active filter.
    let mut conds: Vec<String> = vec!["r.status = 'published'".to_owned()];
    let mut params: Vec<rusqlite::types::Value> = Vec::new();

    if let Some(title) = &query.title {
      conds.push("r.title LIKE '%' || ? || '%'".to_owned());
      params.push(title.clone().into());
    }

    if let Some(subject) = &query.subject {
      conds.push(
        "EXISTS (SELECT 1 FROM resource_subjects rs
                 JOIN subjects s ON s.subject_id = rs.subject_id
                 WHERE rs.resource_id = r.resource_id
                   AND s.name LIKE '%' || ? || '%')"
          .to_owned(),
      );
      params.push(subject.clone().into());
    }

    if !query.subject_slugs.is_empty() {
      // AND-match: the per-resource linked count over the selected slugs
      // must equal the number of slugs selected.
      conds.push(format!(
        "r.resource_id IN (
           SELECT rs.resource_id FROM resource_subjects rs
           JOIN subjects s ON s.subject_id = rs.subject_id
           WHERE s.slug IN ({})
           GROUP BY rs.resource_id
           HAVING COUNT(DISTINCT s.subject_id) = ?)",
        placeholders(query.subject_slugs.len())
      ));
      for slug in &query.subject_slugs {
        params.push(slug.clone().into());
      }
      params.push((query.subject_slugs.len() as i64).into());
    }

    if let Some(range) = query.created {
      let (lower, upper) = range.bounds(Utc::now());
      conds.push("r.created_at >= ? AND r.created_at < ?".to_owned());
      params.push(encode_dt(lower).into());
      params.push(encode_dt(upper).into());
    }

    let where_clause = conds.join(" AND ");
    let limit = i64::from(page.size);
    let offset = page.offset() as i64;

    let (raws, total): (Vec<(RawResource, Vec<RawSubject>)>, u64) = self
      .conn
      .call(move |conn| {
        let count_sql =
          format!("SELECT COUNT(*) FROM resources r WHERE {where_clause}");
        let total: i64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(params.iter()),
          |row| row.get(0),
        )?;

        let list_sql = format!(
          "SELECT {RESOURCE_COLUMNS} FROM resources r
           WHERE {where_clause}
           ORDER BY r.created_at DESC, r.slug
           LIMIT ? OFFSET ?"
        );
        params.push(limit.into());
        params.push(offset.into());

        let mut stmt = conn.prepare(&list_sql)?;
        let page_rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), raw_resource_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(page_rows.len());
        for raw in page_rows {
          let subjects = subjects_for_resource(conn, &raw.resource_id)?;
          rows.push((raw, subjects));
        }

        Ok((rows, total as u64))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(decode_detail)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page::build(items, total, page))
  }

  async fn delete_resource(&self, resource_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(resource_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM resources WHERE resource_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ResourceNotFound(resource_id));
    }
    Ok(())
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let comment = Comment {
      comment_id:  Uuid::new_v4(),
      resource_id: input.resource_id,
      author_id:   input.author_id,
      body:        input.body,
      approved:    false,
      created_at:  Utc::now(),
    };

    let id_str       = encode_uuid(comment.comment_id);
    let resource_str = encode_uuid(comment.resource_id);
    let author_str   = encode_uuid(comment.author_id);
    let body         = comment.body.clone();
    let at_str       = encode_dt(comment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (comment_id, resource_id, author_id, body, approved, created_at)
           VALUES (?1, ?2, ?3, ?4, 0, ?5)",
          rusqlite::params![id_str, resource_str, author_str, body, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn comments_for_resource(
    &self,
    resource_id: Uuid,
    approved_only: bool,
  ) -> Result<Vec<Comment>> {
    let id_str = encode_uuid(resource_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let sql = if approved_only {
          "SELECT comment_id, resource_id, author_id, body, approved, created_at
           FROM comments WHERE resource_id = ?1 AND approved = 1
           ORDER BY created_at DESC"
        } else {
          "SELECT comment_id, resource_id, author_id, body, approved, created_at
           FROM comments WHERE resource_id = ?1
           ORDER BY created_at DESC"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawComment {
              comment_id:  row.get(0)?,
              resource_id: row.get(1)?,
              author_id:   row.get(2)?,
              body:        row.get(3)?,
              approved:    row.get(4)?,
              created_at:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}
