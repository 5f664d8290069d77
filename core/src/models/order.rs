// core/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

use super::cart::SimpleProduct;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Complete,
  Failed,
}

impl PaymentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Complete => "complete",
      PaymentStatus::Failed => "failed",
    }
  }

  /// Pending may settle either way; a settled order stays settled.
  pub fn can_transition_to(self, next: PaymentStatus) -> bool {
    match (self, next) {
      (current, next) if current == next => true,
      (PaymentStatus::Pending, _) => true,
      _ => false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Order {
  pub id: i64,
  pub customer_id: i64,
  pub placed_at: DateTime<Utc>,
  pub payment_status: PaymentStatus,
}

/// An order line. `unit_price_cents` is the price frozen when the order was placed;
/// `product.unit_price_cents` is the product's current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
  pub id: i64,
  pub product: SimpleProduct,
  pub quantity: i32,
  pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
  pub id: i64,
  pub customer_id: i64,
  pub placed_at: DateTime<Utc>,
  pub payment_status: PaymentStatus,
  pub items: Vec<OrderItem>,
}

impl OrderDetail {
  pub fn assemble(order: Order, items: Vec<OrderItem>) -> Self {
    OrderDetail {
      id: order.id,
      customer_id: order.customer_id,
      placed_at: order.placed_at,
      payment_status: order.payment_status,
      items,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
  pub cart_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrder {
  pub payment_status: PaymentStatus,
}
