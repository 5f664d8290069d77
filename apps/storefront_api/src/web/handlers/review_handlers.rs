// apps/storefront_api/src/web/handlers/review_handlers.rs

//! Reviews nested under `/products/{product_id}/reviews`.

use actix_web::{web, HttpResponse};
use storefront::models::{ReviewInput, ReviewPatch};
use storefront::services::catalog;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;

#[instrument(name = "handler::list_reviews", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn list_reviews_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let reviews = catalog::list_reviews(app_state.ds(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(reviews))
}

#[instrument(name = "handler::create_review", skip(app_state, path, payload), fields(product_id = %path.as_ref()))]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  payload: web::Json<ReviewInput>,
) -> Result<HttpResponse, AppError> {
  let review = catalog::create_review(app_state.ds(), path.into_inner(), &payload).await?;
  Ok(HttpResponse::Created().json(review))
}

#[instrument(name = "handler::get_review", skip(app_state, path))]
pub async fn get_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
  let (product_id, review_id) = path.into_inner();
  let review = catalog::get_review(app_state.ds(), product_id, review_id).await?;
  Ok(HttpResponse::Ok().json(review))
}

#[instrument(name = "handler::update_review", skip(app_state, caller, path, payload))]
pub async fn update_review_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<(i64, i64)>,
  payload: web::Json<ReviewInput>,
) -> Result<HttpResponse, AppError> {
  let (product_id, review_id) = path.into_inner();
  let review = catalog::update_review(app_state.ds(), caller.user(), product_id, review_id, &payload).await?;
  Ok(HttpResponse::Ok().json(review))
}

#[instrument(name = "handler::patch_review", skip(app_state, caller, path, payload))]
pub async fn patch_review_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<(i64, i64)>,
  payload: web::Json<ReviewPatch>,
) -> Result<HttpResponse, AppError> {
  let (product_id, review_id) = path.into_inner();
  let review =
    catalog::patch_review(app_state.ds(), caller.user(), product_id, review_id, payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(review))
}

#[instrument(name = "handler::delete_review", skip(app_state, caller, path))]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
  let (product_id, review_id) = path.into_inner();
  catalog::delete_review(app_state.ds(), caller.user(), product_id, review_id).await?;
  Ok(HttpResponse::NoContent().finish())
}
