// apps/storefront_api/src/web/handlers/collection_handlers.rs

use actix_web::{web, HttpResponse};
use storefront::models::{CollectionInput, CollectionPatch};
use storefront::services::catalog;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;

#[instrument(name = "handler::list_collections", skip(app_state))]
pub async fn list_collections_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let collections = catalog::list_collections(app_state.ds()).await?;
  Ok(HttpResponse::Ok().json(collections))
}

#[instrument(name = "handler::create_collection", skip(app_state, caller, payload), fields(user_id = ?caller.id()))]
pub async fn create_collection_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  payload: web::Json<CollectionInput>,
) -> Result<HttpResponse, AppError> {
  let collection = catalog::create_collection(app_state.ds(), caller.user(), &payload).await?;
  Ok(HttpResponse::Created().json(collection))
}

#[instrument(name = "handler::get_collection", skip(app_state, path), fields(collection_id = %path.as_ref()))]
pub async fn get_collection_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let collection = catalog::get_collection(app_state.ds(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(collection))
}

#[instrument(name = "handler::update_collection", skip(app_state, caller, path, payload), fields(collection_id = %path.as_ref()))]
pub async fn update_collection_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
  payload: web::Json<CollectionInput>,
) -> Result<HttpResponse, AppError> {
  let collection = catalog::update_collection(app_state.ds(), caller.user(), path.into_inner(), &payload).await?;
  Ok(HttpResponse::Ok().json(collection))
}

#[instrument(name = "handler::patch_collection", skip(app_state, caller, path, payload), fields(collection_id = %path.as_ref()))]
pub async fn patch_collection_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
  payload: web::Json<CollectionPatch>,
) -> Result<HttpResponse, AppError> {
  let collection =
    catalog::patch_collection(app_state.ds(), caller.user(), path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(collection))
}

#[instrument(name = "handler::delete_collection", skip(app_state, caller, path), fields(collection_id = %path.as_ref()))]
pub async fn delete_collection_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  catalog::delete_collection(app_state.ds(), caller.user(), path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}
