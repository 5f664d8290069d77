// core/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::FieldErrors;

/// Smallest accepted unit price, in cents.
pub const MIN_UNIT_PRICE_CENTS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Product {
  pub id: i64,
  pub title: String,
  pub slug: String,
  pub description: Option<String>,
  pub unit_price_cents: i64,
  pub inventory: i32,
  pub collection_id: i64,
  pub last_update: DateTime<Utc>,
}

impl Product {
  /// Unit price with 10% tax, rounded half up to the cent.
  pub fn price_with_tax_cents(&self) -> i64 {
    (self.unit_price_cents * 11 + 5) / 10
  }
}

/// Product as returned to callers, with the derived tax-inclusive price.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
  #[serde(flatten)]
  pub product: Product,
  pub price_with_tax_cents: i64,
}

impl From<Product> for ProductView {
  fn from(product: Product) -> Self {
    let price_with_tax_cents = product.price_with_tax_cents();
    ProductView {
      product,
      price_with_tax_cents,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub slug: String,
  #[serde(default)]
  pub description: Option<String>,
  pub unit_price_cents: i64,
  pub inventory: i32,
  pub collection_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
  pub title: Option<String>,
  pub slug: Option<String>,
  pub description: Option<String>,
  pub unit_price_cents: Option<i64>,
  pub inventory: Option<i32>,
  pub collection_id: Option<i64>,
}

impl ProductInput {
  /// Field checks that need no datastore access. The collection reference is
  /// checked by the catalog service.
  pub fn validate(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.check_text("title", &self.title, 255);
    errors.check_text("slug", &self.slug, 255);
    errors.check_min("unit_price_cents", self.unit_price_cents, MIN_UNIT_PRICE_CENTS);
    errors.check_min("inventory", i64::from(self.inventory), 0);
    errors
  }
}

impl ProductPatch {
  pub fn apply_to(self, current: &Product) -> ProductInput {
    ProductInput {
      title: self.title.unwrap_or_else(|| current.title.clone()),
      slug: self.slug.unwrap_or_else(|| current.slug.clone()),
      description: self.description.or_else(|| current.description.clone()),
      unit_price_cents: self.unit_price_cents.unwrap_or(current.unit_price_cents),
      inventory: self.inventory.unwrap_or(current.inventory),
      collection_id: self.collection_id.unwrap_or(current.collection_id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn product(unit_price_cents: i64) -> Product {
    Product {
      id: 1,
      title: "Mug".to_string(),
      slug: "mug".to_string(),
      description: None,
      unit_price_cents,
      inventory: 3,
      collection_id: 1,
      last_update: Utc::now(),
    }
  }

  #[test]
  fn tax_is_rounded_to_the_cent() {
    assert_eq!(product(1000).price_with_tax_cents(), 1100);
    assert_eq!(product(1999).price_with_tax_cents(), 2199);
    assert_eq!(product(105).price_with_tax_cents(), 116);
  }

  #[test]
  fn view_flattens_the_product() {
    let json = serde_json::to_value(ProductView::from(product(250))).unwrap();
    assert_eq!(json["title"], "Mug");
    assert_eq!(json["unit_price_cents"], 250);
    assert_eq!(json["price_with_tax_cents"], 275);
  }

  #[test]
  fn patch_keeps_unset_fields() {
    let current = product(250);
    let input = ProductPatch {
      inventory: Some(9),
      ..Default::default()
    }
    .apply_to(&current);
    assert_eq!(input.title, "Mug");
    assert_eq!(input.unit_price_cents, 250);
    assert_eq!(input.inventory, 9);
  }

  #[test]
  fn cheap_and_negative_values_are_invalid() {
    let input = ProductInput {
      title: "Mug".to_string(),
      slug: "mug".to_string(),
      description: None,
      unit_price_cents: 99,
      inventory: -1,
      collection_id: 1,
    };
    let errors = input.validate();
    assert!(errors.contains("unit_price_cents"));
    assert!(errors.contains("inventory"));
    assert!(!errors.contains("title"));
  }
}
