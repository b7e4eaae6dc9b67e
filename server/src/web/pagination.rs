// server/src/web/pagination.rs

use serde::{Deserialize, Serialize};

pub const PRODUCTS_PER_PAGE: i64 = 16;
pub const REVIEWS_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
  pub page: Option<i64>,
  pub per_page: Option<i64>,
}

/// A resolved page window: 1-based page number and a bounded page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
  pub page: i64,
  pub per_page: i64,
}

impl PageWindow {
  pub fn resolve(query: PageQuery, default_per_page: i64) -> Self {
    let page = query.page.filter(|p| *p >= 1).unwrap_or(1);
    let per_page = query
      .per_page
      .filter(|n| *n >= 1)
      .unwrap_or(default_per_page)
      .min(MAX_PER_PAGE);
    Self { page, per_page }
  }

  pub fn offset(&self) -> i64 {
    (self.page - 1).saturating_mul(self.per_page)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub current_page: i64,
  pub per_page: i64,
  pub total_items: i64,
  pub total_pages: i64,
}

impl Pagination {
  pub fn new(window: PageWindow, total_items: i64) -> Self {
    Self {
      current_page: window.page,
      per_page: window.per_page,
      total_items,
      total_pages: (total_items + window.per_page - 1) / window.per_page,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_and_bounds_apply() {
    let w = PageWindow::resolve(PageQuery::default(), PRODUCTS_PER_PAGE);
    assert_eq!(w, PageWindow { page: 1, per_page: 16 });
    assert_eq!(w.offset(), 0);

    let w = PageWindow::resolve(PageQuery { page: Some(0), per_page: Some(-3) }, REVIEWS_PER_PAGE);
    assert_eq!(w, PageWindow { page: 1, per_page: 10 });

    let w = PageWindow::resolve(PageQuery { page: Some(3), per_page: Some(1000) }, PRODUCTS_PER_PAGE);
    assert_eq!(w.per_page, 100);
    assert_eq!(w.offset(), 200);
  }

  #[test]
  fn total_pages_rounds_up() {
    let w = PageWindow { page: 2, per_page: 16 };
    assert_eq!(Pagination::new(w, 33).total_pages, 3);
    assert_eq!(Pagination::new(w, 32).total_pages, 2);
    assert_eq!(Pagination::new(w, 0).total_pages, 0);
  }
}
