// core/src/services/carts.rs

//! Anonymous carts. Every item operation is scoped to the cart in the path;
//! an item id belonging to another cart is reported as not found.

use tracing::{debug, instrument};
use uuid::Uuid;

use super::check_reference;
use crate::datastore::Datastore;
use crate::error::StoreResult;
use crate::models::{AddCartItem, CartDetail, CartLine, UpdateCartItem};

pub async fn create_cart(ds: &dyn Datastore) -> StoreResult<CartDetail> {
  let cart = ds.create_cart().await?;
  debug!(cart_id = %cart.id, "Cart created.");
  Ok(cart)
}

pub async fn get_cart(ds: &dyn Datastore, cart_id: Uuid) -> StoreResult<CartDetail> {
  ds.get_cart(cart_id).await
}

pub async fn delete_cart(ds: &dyn Datastore, cart_id: Uuid) -> StoreResult<()> {
  ds.delete_cart(cart_id).await
}

pub async fn list_items(ds: &dyn Datastore, cart_id: Uuid) -> StoreResult<Vec<CartLine>> {
  Ok(ds.get_cart(cart_id).await?.items)
}

pub async fn get_item(ds: &dyn Datastore, cart_id: Uuid, item_id: i64) -> StoreResult<CartLine> {
  ds.get_cart_item(cart_id, item_id).await
}

/// Adds `input.quantity` of a product, merging into the existing line for
/// that product if there is one.
#[instrument(
  name = "carts::add_item",
  skip(ds, input),
  fields(cart_id = %cart_id, product_id = input.product_id, quantity = input.quantity),
  err(Display)
)]
pub async fn add_item(ds: &dyn Datastore, cart_id: Uuid, input: &AddCartItem) -> StoreResult<CartLine> {
  ds.get_cart(cart_id).await?;
  let mut errors = input.validate();
  check_reference(&mut errors, "product_id", ds.get_product(input.product_id).await, || {
    "No product with the given ID was found.".to_string()
  })?;
  errors.into_result()?;
  ds.add_cart_item(cart_id, input.product_id, input.quantity).await
}

#[instrument(name = "carts::update_item", skip(ds, input), fields(cart_id = %cart_id), err(Display))]
pub async fn update_item(
  ds: &dyn Datastore,
  cart_id: Uuid,
  item_id: i64,
  input: &UpdateCartItem,
) -> StoreResult<CartLine> {
  ds.get_cart_item(cart_id, item_id).await?;
  input.validate().into_result()?;
  ds.set_cart_item_quantity(cart_id, item_id, input.quantity).await
}

pub async fn remove_item(ds: &dyn Datastore, cart_id: Uuid, item_id: i64) -> StoreResult<()> {
  ds.remove_cart_item(cart_id, item_id).await
}
