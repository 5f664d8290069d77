// core/src/services/orders.rs

//! Order placement and the payment-status lifecycle.
//!
//! Customers see and place their own orders. Staff see every order and are
//! the only callers allowed to settle or delete one.

use tracing::{info, instrument, warn};

use crate::datastore::{Datastore, EMPTY_CART};
use crate::error::{StoreError, StoreResult};
use crate::models::{OrderDetail, PlaceOrder, UpdateOrder, User};
use crate::permissions::{require_admin, require_authenticated};

#[instrument(name = "orders::list", skip(ds, user), err(Display))]
pub async fn list_orders(ds: &dyn Datastore, user: Option<&User>) -> StoreResult<Vec<OrderDetail>> {
  let user = require_authenticated(user)?;
  if user.is_admin() {
    return ds.list_orders(None).await;
  }
  match ds.find_customer_by_user(user.id).await? {
    Some(customer) => ds.list_orders(Some(customer.id)).await,
    None => Ok(Vec::new()),
  }
}

/// Another customer's order is reported as not found rather than forbidden.
#[instrument(name = "orders::get", skip(ds, user), err(Display))]
pub async fn get_order(ds: &dyn Datastore, user: Option<&User>, id: i64) -> StoreResult<OrderDetail> {
  let user = require_authenticated(user)?;
  let order = ds.get_order(id).await?;
  if user.is_admin() {
    return Ok(order);
  }
  let owns = ds
    .find_customer_by_user(user.id)
    .await?
    .map(|customer| customer.id == order.customer_id)
    .unwrap_or(false);
  if owns {
    Ok(order)
  } else {
    Err(StoreError::not_found("Order", id))
  }
}

/// Converts the cart into a pending order owned by the caller's customer record.
///
/// A missing or empty cart is rejected before the customer record is created.
/// The datastore checks both again inside the conversion.
#[instrument(
  name = "orders::place_order",
  skip(ds, user, input),
  fields(cart_id = %input.cart_id, user_id = ?user.map(|u| u.id)),
  err(Display)
)]
pub async fn place_order(ds: &dyn Datastore, user: Option<&User>, input: &PlaceOrder) -> StoreResult<OrderDetail> {
  let user = require_authenticated(user)?;
  if ds.get_cart(input.cart_id).await?.is_empty() {
    return Err(StoreError::invalid("cart_id", EMPTY_CART));
  }
  let customer = ds.ensure_customer(user.id).await?;
  let order = ds.place_order(input.cart_id, customer.id).await?;
  info!(order_id = order.id, customer_id = customer.id, items = order.items.len(), "Order placed.");
  Ok(order)
}

#[instrument(
  name = "orders::update_payment_status",
  skip(ds, user, input),
  fields(next = ?input.payment_status),
  err(Display)
)]
pub async fn update_order(
  ds: &dyn Datastore,
  user: Option<&User>,
  id: i64,
  input: &UpdateOrder,
) -> StoreResult<OrderDetail> {
  require_admin(user)?;
  let current = ds.get_order(id).await?;
  if !current.payment_status.can_transition_to(input.payment_status) {
    warn!(order_id = id, current = ?current.payment_status, "Rejected payment status transition.");
    return Err(StoreError::invalid(
      "payment_status",
      format!(
        "Cannot change payment status of a {} order.",
        current.payment_status.as_str()
      ),
    ));
  }
  ds.set_payment_status(id, input.payment_status).await
}

#[instrument(name = "orders::delete", skip(ds, user), err(Display))]
pub async fn delete_order(ds: &dyn Datastore, user: Option<&User>, id: i64) -> StoreResult<()> {
  require_admin(user)?;
  ds.delete_order(id).await?;
  info!(order_id = id, "Order deleted.");
  Ok(())
}
