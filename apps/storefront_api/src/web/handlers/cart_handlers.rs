// apps/storefront_api/src/web/handlers/cart_handlers.rs

//! Carts and their items. No authentication: the cart id is the capability.

use actix_web::{web, HttpResponse};
use storefront::models::{AddCartItem, UpdateCartItem};
use storefront::services::carts;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::create_cart", skip(app_state))]
pub async fn create_cart_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let cart = carts::create_cart(app_state.ds()).await?;
  info!(cart_id = %cart.id, "Cart created.");
  Ok(HttpResponse::Created().json(cart))
}

#[instrument(name = "handler::get_cart", skip(app_state, path), fields(cart_id = %path.as_ref()))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let cart = carts::get_cart(app_state.ds(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(cart))
}

#[instrument(name = "handler::delete_cart", skip(app_state, path), fields(cart_id = %path.as_ref()))]
pub async fn delete_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  carts::delete_cart(app_state.ds(), path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::list_cart_items", skip(app_state, path), fields(cart_id = %path.as_ref()))]
pub async fn list_items_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let items = carts::list_items(app_state.ds(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(items))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, path, req_payload),
  fields(cart_id = %path.as_ref(), product_id = %req_payload.product_id, quantity = %req_payload.quantity)
)]
pub async fn add_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<AddCartItem>,
) -> Result<HttpResponse, AppError> {
  let line = carts::add_item(app_state.ds(), path.into_inner(), &req_payload).await?;
  info!(item_id = line.id, quantity = line.quantity, "Item added to cart.");
  Ok(HttpResponse::Created().json(line))
}

#[instrument(name = "handler::get_cart_item", skip(app_state, path))]
pub async fn get_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(Uuid, i64)>,
) -> Result<HttpResponse, AppError> {
  let (cart_id, item_id) = path.into_inner();
  let line = carts::get_item(app_state.ds(), cart_id, item_id).await?;
  Ok(HttpResponse::Ok().json(line))
}

#[instrument(name = "handler::update_cart_item", skip(app_state, path, payload))]
pub async fn update_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(Uuid, i64)>,
  payload: web::Json<UpdateCartItem>,
) -> Result<HttpResponse, AppError> {
  let (cart_id, item_id) = path.into_inner();
  let line = carts::update_item(app_state.ds(), cart_id, item_id, &payload).await?;
  Ok(HttpResponse::Ok().json(line))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, path))]
pub async fn remove_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(Uuid, i64)>,
) -> Result<HttpResponse, AppError> {
  let (cart_id, item_id) = path.into_inner();
  carts::remove_item(app_state.ds(), cart_id, item_id).await?;
  Ok(HttpResponse::NoContent().finish())
}
