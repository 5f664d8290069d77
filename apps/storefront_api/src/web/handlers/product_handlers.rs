// apps/storefront_api/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use storefront::models::{ProductInput, ProductPatch};
use storefront::services::catalog;
use storefront::{Pagination, ProductOrdering, ProductQuery};
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;

/// Query string accepted by the product listing.
#[derive(Deserialize, Debug, Default)]
pub struct ListProductsQuery {
  pub collection_id: Option<i64>,
  #[serde(rename = "unit_price__gt")]
  pub unit_price_gt: Option<i64>,
  #[serde(rename = "unit_price__lt")]
  pub unit_price_lt: Option<i64>,
  pub search: Option<String>,
  pub ordering: Option<String>,
  pub limit: Option<u32>,
  pub offset: Option<u32>,
}

impl ListProductsQuery {
  pub fn into_query(self, config: &AppConfig) -> Result<ProductQuery, AppError> {
    let ordering = match self.ordering.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
      Some(raw) => raw.parse::<ProductOrdering>()?,
      None => ProductOrdering::default(),
    };
    Ok(ProductQuery {
      collection_id: self.collection_id,
      unit_price_gt: self.unit_price_gt,
      unit_price_lt: self.unit_price_lt,
      search: self.search,
      ordering,
      page: Pagination::new(self.limit, self.offset, config.default_page_size, config.max_page_size),
    })
  }
}

#[instrument(name = "handler::list_products", skip(app_state, query_params))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let query = query_params.into_inner().into_query(&app_state.config)?;
  let page = catalog::list_products(app_state.ds(), &query).await?;
  info!(count = page.count, returned = page.results.len(), "Products listed.");
  Ok(HttpResponse::Ok().json(page))
}

#[instrument(name = "handler::create_product", skip(app_state, caller, payload), fields(user_id = ?caller.id()))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let product = catalog::create_product(app_state.ds(), caller.user(), &payload).await?;
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let product = catalog::get_product(app_state.ds(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, caller, path, payload), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
  payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let product = catalog::update_product(app_state.ds(), caller.user(), path.into_inner(), &payload).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::patch_product", skip(app_state, caller, path, payload), fields(product_id = %path.as_ref()))]
pub async fn patch_product_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
  payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let product = catalog::patch_product(app_state.ds(), caller.user(), path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::delete_product", skip(app_state, caller, path), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  catalog::delete_product(app_state.ds(), caller.user(), path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
  use super::*;
  use storefront::OrderField;

  #[test]
  fn limit_is_capped_and_ordering_parsed() {
    let config = AppConfig::default();
    let query = ListProductsQuery {
      ordering: Some("-last_update".to_string()),
      limit: Some(10_000),
      ..Default::default()
    }
    .into_query(&config)
    .unwrap();
    assert_eq!(query.page.limit, config.max_page_size);
    assert_eq!(query.ordering.field, OrderField::LastUpdate);
    assert!(query.ordering.descending);
  }

  #[test]
  fn unknown_ordering_is_a_field_error() {
    let err = ListProductsQuery {
      ordering: Some("title".to_string()),
      ..Default::default()
    }
    .into_query(&AppConfig::default())
    .unwrap_err();
    assert!(matches!(err, AppError::Store(ref e) if e.field_errors().unwrap().contains("ordering")));
  }
}
