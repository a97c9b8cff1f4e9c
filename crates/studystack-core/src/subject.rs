//! Subject — a named tag used to classify resources.
//!
//! Subjects are created either explicitly or lazily, when a resource form
//! submits a free-text name with no case-insensitive match. The parsing and
//! dedup rules for that free-text field live here, as pure functions, so the
//! store backends only have to look names up and attach them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A classification tag with a unique, case-insensitive name and a unique
/// URL slug derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id: Uuid,
  pub name:       String,
  pub slug:       String,
  pub created_at: DateTime<Utc>,
}

// ─── Free-text parsing ───────────────────────────────────────────────────────

/// Parse a comma-separated list of subject names.
///
/// Each name is trimmed, internal whitespace is collapsed to single spaces,
/// empties are dropped, and duplicates are removed case-insensitively while
/// preserving first-seen casing and order.
pub fn parse_subject_names(input: &str) -> Vec<String> {
  let mut seen: Vec<String> = Vec::new();
  let mut names = Vec::new();

  for raw in input.split(',') {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
      continue;
    }
    let key = name.to_lowercase();
    if seen.contains(&key) {
      continue;
    }
    seen.push(key);
    names.push(name);
  }

  names
}

/// Parse `free_text` and drop every name already covered by an
/// already-selected subject (case-insensitive). The survivors are the names
/// the store must look up or create.
pub fn merge_free_text(free_text: &str, selected_names: &[String]) -> Vec<String> {
  let selected: Vec<String> =
    selected_names.iter().map(|n| n.to_lowercase()).collect();

  parse_subject_names(free_text)
    .into_iter()
    .filter(|name| !selected.contains(&name.to_lowercase()))
    .collect()
}
