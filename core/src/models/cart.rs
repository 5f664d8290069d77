// core/src/models/cart.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::FieldErrors;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Cart {
  pub id: Uuid,
  pub created_at: DateTime<Utc>,
}

/// The part of a product a cart or order line shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleProduct {
  pub id: i64,
  pub title: String,
  pub unit_price_cents: i64,
}

/// A cart line item joined with its product at the current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
  pub id: i64,
  pub product: SimpleProduct,
  pub quantity: i32,
  pub total_price_cents: i64,
}

impl CartLine {
  pub fn new(id: i64, product: SimpleProduct, quantity: i32) -> Self {
    let total_price_cents = product.unit_price_cents * i64::from(quantity);
    CartLine {
      id,
      product,
      quantity,
      total_price_cents,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartDetail {
  pub id: Uuid,
  pub created_at: DateTime<Utc>,
  pub items: Vec<CartLine>,
  pub total_price_cents: i64,
}

impl CartDetail {
  pub fn assemble(cart: Cart, items: Vec<CartLine>) -> Self {
    let total_price_cents = items.iter().map(|line| line.total_price_cents).sum();
    CartDetail {
      id: cart.id,
      created_at: cart.created_at,
      items,
      total_price_cents,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCartItem {
  pub product_id: i64,
  pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartItem {
  pub quantity: i32,
}

/// Field error for an upsert whose combined quantity no longer fits a line.
pub const QUANTITY_OVERFLOW: &str = "Ensure the combined quantity is no more than 2147483647.";

pub(crate) fn check_quantity(errors: &mut FieldErrors, quantity: i32) {
  errors.check_min("quantity", i64::from(quantity), 1);
}

impl AddCartItem {
  pub fn validate(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_quantity(&mut errors, self.quantity);
    errors
  }
}

impl UpdateCartItem {
  pub fn validate(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_quantity(&mut errors, self.quantity);
    errors
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line(id: i64, unit_price_cents: i64, quantity: i32) -> CartLine {
    CartLine::new(
      id,
      SimpleProduct {
        id,
        title: format!("product {}", id),
        unit_price_cents,
      },
      quantity,
    )
  }

  #[test]
  fn totals_follow_quantities() {
    let cart = Cart {
      id: Uuid::new_v4(),
      created_at: Utc::now(),
    };
    let detail = CartDetail::assemble(cart, vec![line(1, 250, 2), line(2, 1000, 1)]);
    assert_eq!(detail.items[0].total_price_cents, 500);
    assert_eq!(detail.total_price_cents, 1500);
  }

  #[test]
  fn zero_quantity_is_rejected() {
    let errors = AddCartItem {
      product_id: 1,
      quantity: 0,
    }
    .validate();
    assert!(errors.contains("quantity"));
    assert!(UpdateCartItem { quantity: 4 }.validate().is_empty());
  }
}
