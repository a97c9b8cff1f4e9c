//! Query parameters for listing published resources.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Created-date buckets offered by the list filter form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatedRange {
  Today,
  PastWeek,
  ThisMonth,
  ThisYear,
}

impl CreatedRange {
  /// The half-open UTC interval `[lower, upper)` this bucket covers,
  /// evaluated against `now`. The upper bound is always the start of
  /// tomorrow.
  pub fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let day_start = today.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let upper = day_start + Duration::days(1);

    let lower = match self {
      Self::Today => day_start,
      Self::PastWeek => day_start - Duration::days(7),
      Self::ThisMonth => today
        .with_day(1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc(),
      Self::ThisYear => today
        .with_ordinal(1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc(),
    };

    (lower, upper)
  }
}

/// Filters for [`crate::store::StackStore::list_published`]. All fields are
/// optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
  /// Case-insensitive title substring.
  pub title:         Option<String>,
  /// Case-insensitive subject-name substring; matches resources linked to
  /// at least one such subject.
  pub subject:       Option<String>,
  /// Multi-select AND-match: a resource must be linked to *every* slug
  /// listed here, not merely one.
  pub subject_slugs: Vec<String>,
  pub created:       Option<CreatedRange>,
}
