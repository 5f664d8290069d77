// core/src/query.rs

//! Product listing: filters, search, ordering and limit/offset paging.

use serde::Serialize;
use std::str::FromStr;

use crate::error::StoreError;
use crate::models::Product;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
  Id,
  UnitPrice,
  LastUpdate,
}

impl OrderField {
  /// Column name in the `products` table.
  pub fn column(self) -> &'static str {
    match self {
      OrderField::Id => "id",
      OrderField::UnitPrice => "unit_price_cents",
      OrderField::LastUpdate => "last_update",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductOrdering {
  pub field: OrderField,
  pub descending: bool,
}

impl Default for ProductOrdering {
  fn default() -> Self {
    ProductOrdering {
      field: OrderField::UnitPrice,
      descending: false,
    }
  }
}

impl FromStr for ProductOrdering {
  type Err = StoreError;

  /// Accepts `id`, `unit_price` or `last_update`, optionally prefixed with `-`.
  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    let (descending, name) = match raw.strip_prefix('-') {
      Some(rest) => (true, rest),
      None => (false, raw),
    };
    let field = match name {
      "id" => OrderField::Id,
      "unit_price" => OrderField::UnitPrice,
      "last_update" => OrderField::LastUpdate,
      other => {
        return Err(StoreError::invalid(
          "ordering",
          format!("'{}' is not a valid ordering field.", other),
        ))
      }
    };
    Ok(ProductOrdering { field, descending })
  }
}

impl ProductOrdering {
  pub fn compare(&self, a: &Product, b: &Product) -> std::cmp::Ordering {
    let primary = match self.field {
      OrderField::Id => a.id.cmp(&b.id),
      OrderField::UnitPrice => a.unit_price_cents.cmp(&b.unit_price_cents),
      OrderField::LastUpdate => a.last_update.cmp(&b.last_update),
    };
    let primary = if self.descending { primary.reverse() } else { primary };
    primary.then_with(|| a.id.cmp(&b.id))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  pub limit: u32,
  pub offset: u32,
}

impl Default for Pagination {
  fn default() -> Self {
    Pagination {
      limit: DEFAULT_PAGE_SIZE,
      offset: 0,
    }
  }
}

impl Pagination {
  /// Fills in `default_limit` when no limit was asked for and caps it at `max_limit`.
  pub fn new(limit: Option<u32>, offset: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
    let limit = limit.filter(|l| *l > 0).unwrap_or(default_limit).min(max_limit).max(1);
    Pagination {
      limit,
      offset: offset.unwrap_or(0),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
  pub collection_id: Option<i64>,
  pub unit_price_gt: Option<i64>,
  pub unit_price_lt: Option<i64>,
  pub search: Option<String>,
  pub ordering: ProductOrdering,
  pub page: Pagination,
}

impl ProductQuery {
  /// The search term, trimmed, or `None` when it is blank.
  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }

  /// In-memory evaluation of the filters and search term.
  pub fn matches(&self, product: &Product) -> bool {
    if let Some(collection_id) = self.collection_id {
      if product.collection_id != collection_id {
        return false;
      }
    }
    if let Some(gt) = self.unit_price_gt {
      if product.unit_price_cents <= gt {
        return false;
      }
    }
    if let Some(lt) = self.unit_price_lt {
      if product.unit_price_cents >= lt {
        return false;
      }
    }
    if let Some(term) = self.search_term() {
      let term = term.to_lowercase();
      let in_title = product.title.to_lowercase().contains(&term);
      let in_description = product
        .description
        .as_deref()
        .map(|d| d.to_lowercase().contains(&term))
        .unwrap_or(false);
      if !in_title && !in_description {
        return false;
      }
    }
    true
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
  pub count: u64,
  pub limit: u32,
  pub offset: u32,
  pub results: Vec<T>,
}

impl<T> Page<T> {
  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      count: self.count,
      limit: self.limit,
      offset: self.offset,
      results: self.results.into_iter().map(f).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn product(id: i64, title: &str, unit_price_cents: i64) -> Product {
    Product {
      id,
      title: title.to_string(),
      slug: title.to_lowercase(),
      description: Some(format!("All about {}", title)),
      unit_price_cents,
      inventory: 1,
      collection_id: id % 2,
      last_update: Utc::now(),
    }
  }

  #[test]
  fn ordering_parses_direction() {
    let o: ProductOrdering = "-unit_price".parse().unwrap();
    assert_eq!(o.field, OrderField::UnitPrice);
    assert!(o.descending);
    let o: ProductOrdering = "id".parse().unwrap();
    assert!(!o.descending);
    let err = "title".parse::<ProductOrdering>().unwrap_err();
    assert!(err.field_errors().unwrap().contains("ordering"));
  }

  #[test]
  fn pagination_is_capped() {
    assert_eq!(Pagination::new(None, None, 10, 100), Pagination { limit: 10, offset: 0 });
    assert_eq!(Pagination::new(Some(500), Some(20), 10, 100).limit, 100);
    assert_eq!(Pagination::new(Some(0), None, 10, 100).limit, 10);
  }

  #[test]
  fn filters_and_search_combine() {
    let query = ProductQuery {
      unit_price_gt: Some(100),
      search: Some("  MUG ".to_string()),
      ..Default::default()
    };
    assert!(query.matches(&product(1, "Mug", 500)));
    assert!(!query.matches(&product(2, "Mug", 100)));
    assert!(!query.matches(&product(3, "Plate", 500)));
  }

  #[test]
  fn equal_prices_fall_back_to_id() {
    let ordering = ProductOrdering::default();
    let a = product(2, "A", 300);
    let b = product(1, "B", 300);
    assert_eq!(ordering.compare(&a, &b), std::cmp::Ordering::Greater);
  }
}
