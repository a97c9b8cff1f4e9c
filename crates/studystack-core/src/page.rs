//! Explicit pagination contract: (collection slice, page size, page number)
//! in, a fully-described page out. Nothing here is framework-implicit.

use serde::{Deserialize, Serialize};

/// Which page the caller wants. Page numbers are 1-based; zero is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  pub number: u32,
  pub size:   u32,
}

impl PageRequest {
  /// The listing surfaces show six resources per page.
  pub const DEFAULT_SIZE: u32 = 6;

  pub fn new(number: u32, size: u32) -> Self {
    Self { number: number.max(1), size: size.max(1) }
  }

  /// Row offset for SQL `LIMIT`/`OFFSET` backends.
  pub fn offset(&self) -> u64 {
    u64::from(self.number - 1) * u64::from(self.size)
  }
}

impl Default for PageRequest {
  fn default() -> Self { Self::new(1, Self::DEFAULT_SIZE) }
}

/// One page of results plus the bookkeeping a paginator widget needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:        Vec<T>,
  pub number:       u32,
  pub size:         u32,
  pub total_items:  u64,
  pub total_pages:  u32,
  pub has_next:     bool,
  pub has_previous: bool,
}

impl<T> Page<T> {
  /// Assemble a page from the already-sliced `items` and the unfiltered
  /// `total_items` count. An empty collection still has one (empty) page.
  pub fn build(items: Vec<T>, total_items: u64, request: PageRequest) -> Self {
    let total_pages = (total_items.div_ceil(u64::from(request.size)).max(1))
      .min(u64::from(u32::MAX)) as u32;

    Self {
      items,
      number: request.number,
      size: request.size,
      total_items,
      total_pages,
      has_next: request.number < total_pages,
      has_previous: request.number > 1,
    }
  }
}
