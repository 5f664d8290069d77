// apps/storefront_api/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use storefront::models::{PlaceOrder, UpdateOrder};
use storefront::services::orders;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::services::notifications::Notification;
use crate::state::AppState;
use crate::web::extractors::Caller;

#[instrument(name = "handler::list_orders", skip(app_state, caller), fields(user_id = ?caller.id()))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let orders = orders::list_orders(app_state.ds(), caller.user()).await?;
  Ok(HttpResponse::Ok().json(orders))
}

/// Converts the cart named in the body into an order for the caller.
#[instrument(
  name = "handler::place_order",
  skip(app_state, caller, req_payload),
  fields(user_id = ?caller.id(), cart_id = %req_payload.cart_id)
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  req_payload: web::Json<PlaceOrder>,
) -> Result<HttpResponse, AppError> {
  let order = orders::place_order(app_state.ds(), caller.user(), &req_payload).await?;

  // The order is committed; a dropped notification must not change the response.
  let queued = app_state.notifier.dispatch(Notification::OrderPlaced {
    order_id: order.id,
    customer_id: order.customer_id,
  });
  if !queued {
    warn!(order_id = order.id, "Order confirmation was not queued.");
  }
  info!(order_id = order.id, "Checkout completed.");
  Ok(HttpResponse::Created().json(order))
}

#[instrument(name = "handler::get_order", skip(app_state, caller, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order = orders::get_order(app_state.ds(), caller.user(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::update_order", skip(app_state, caller, path, payload), fields(order_id = %path.as_ref()))]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
  payload: web::Json<UpdateOrder>,
) -> Result<HttpResponse, AppError> {
  let order = orders::update_order(app_state.ds(), caller.user(), path.into_inner(), &payload).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::delete_order", skip(app_state, caller, path), fields(order_id = %path.as_ref()))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  orders::delete_order(app_state.ds(), caller.user(), path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}
