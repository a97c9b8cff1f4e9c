//! Breadcrumb trails as an explicit contract: an ordered list of
//! `(label, href)` pairs built per page, never derived from ambient state.

use serde::{Deserialize, Serialize};

/// One step of a navigational trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
  pub label: String,
  pub href:  String,
}

/// Ordered trail builder. Every trail starts at the listing root.
#[derive(Debug, Clone, Default)]
pub struct Trail(Vec<Crumb>);

impl Trail {
  /// A trail containing only the home crumb.
  pub fn root() -> Self {
    Self(vec![Crumb { label: "Home".to_owned(), href: "/".to_owned() }])
  }

  pub fn push(mut self, label: &str, href: &str) -> Self {
    self.0.push(Crumb { label: label.to_owned(), href: href.to_owned() });
    self
  }

  pub fn into_crumbs(self) -> Vec<Crumb> { self.0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trail_preserves_order() {
    let crumbs = Trail::root()
      .push("Subjects", "/subjects/")
      .push("Maths", "/subjects/maths/")
      .into_crumbs();

    let labels: Vec<&str> = crumbs.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, &["Home", "Subjects", "Maths"]);
    assert_eq!(crumbs[2].href, "/subjects/maths/");
  }
}
