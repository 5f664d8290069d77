// apps/storefront_api/src/web/handlers/customer_handlers.rs

use actix_web::{web, HttpResponse};
use storefront::models::{CustomerInput, CustomerPatch, CustomerProfile};
use storefront::services::customers;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;

#[instrument(name = "handler::get_me", skip(app_state, caller), fields(user_id = ?caller.id()))]
pub async fn get_me_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let customer = customers::me(app_state.ds(), caller.user()).await?;
  Ok(HttpResponse::Ok().json(customer))
}

#[instrument(name = "handler::update_me", skip(app_state, caller, payload), fields(user_id = ?caller.id()))]
pub async fn update_me_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  payload: web::Json<CustomerProfile>,
) -> Result<HttpResponse, AppError> {
  let customer = customers::update_me(app_state.ds(), caller.user(), &payload).await?;
  Ok(HttpResponse::Ok().json(customer))
}

#[instrument(name = "handler::list_customers", skip(app_state, caller))]
pub async fn list_customers_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let all = customers::list_customers(app_state.ds(), caller.user()).await?;
  Ok(HttpResponse::Ok().json(all))
}

#[instrument(name = "handler::create_customer", skip(app_state, caller, payload))]
pub async fn create_customer_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  payload: web::Json<CustomerInput>,
) -> Result<HttpResponse, AppError> {
  let customer = customers::create_customer(app_state.ds(), caller.user(), &payload).await?;
  Ok(HttpResponse::Created().json(customer))
}

#[instrument(name = "handler::get_customer", skip(app_state, caller, path), fields(customer_id = %path.as_ref()))]
pub async fn get_customer_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let customer = customers::get_customer(app_state.ds(), caller.user(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(customer))
}

#[instrument(name = "handler::update_customer", skip(app_state, caller, path, payload), fields(customer_id = %path.as_ref()))]
pub async fn update_customer_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
  payload: web::Json<CustomerProfile>,
) -> Result<HttpResponse, AppError> {
  let customer = customers::update_customer(app_state.ds(), caller.user(), path.into_inner(), &payload).await?;
  Ok(HttpResponse::Ok().json(customer))
}

#[instrument(name = "handler::patch_customer", skip(app_state, caller, path, payload), fields(customer_id = %path.as_ref()))]
pub async fn patch_customer_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
  payload: web::Json<CustomerPatch>,
) -> Result<HttpResponse, AppError> {
  let customer =
    customers::patch_customer(app_state.ds(), caller.user(), path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(customer))
}

#[instrument(name = "handler::delete_customer", skip(app_state, caller, path), fields(customer_id = %path.as_ref()))]
pub async fn delete_customer_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  customers::delete_customer(app_state.ds(), caller.user(), path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}
