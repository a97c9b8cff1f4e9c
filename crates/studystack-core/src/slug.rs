//! Slug derivation — URL-safe identifiers from human-readable titles.
//!
//! Normalisation is pure and lives here; uniqueness is a store concern.
//! Backends probe [`candidates`] in order, one existence check per attempt,
//! and take the first free one. There is no upper bound on probing.

/// Normalise `text` to a base slug: ASCII alphanumerics lowercased, every
/// other run of characters collapsed to a single hyphen, no leading or
/// trailing hyphen. An empty or unsplittable input yields `fallback`.
pub fn slugify(text: &str, fallback: &str) -> String {
  let mut slug = String::with_capacity(text.len());
  let mut pending_hyphen = false;

  for c in text.chars() {
    if c.is_ascii_alphanumeric() {
      if pending_hyphen && !slug.is_empty() {
        slug.push('-');
      }
      pending_hyphen = false;
      slug.push(c.to_ascii_lowercase());
    } else {
      pending_hyphen = true;
    }
  }

  if slug.is_empty() { fallback.to_owned() } else { slug }
}

/// The probe sequence for collision resolution: `base`, `base-2`, `base-3`, …
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
  std::iter::once(base.to_owned())
    .chain((2u64..).map(move |n| format!("{base}-{n}")))
}
