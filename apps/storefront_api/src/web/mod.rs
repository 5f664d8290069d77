// apps/storefront_api/src/web/mod.rs

pub mod extractors;
pub mod handlers;
pub mod routes;

pub use routes::configure_app_routes;

use actix_web::web;
use storefront::StoreError;

use crate::errors::AppError;

/// Extractor error handlers plus every route. Used by `main` and by tests.
///
/// Unparseable bodies and query strings become 400s with a `detail` message;
/// a path segment that is not a valid id is treated as an unknown resource.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(
      web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("JSON parse error - {}", err)).into()),
    )
    .app_data(
      web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("Invalid query string - {}", err)).into()),
    )
    .app_data(web::PathConfig::default().error_handler(|err, req| {
      tracing::debug!(path = %req.path(), error = %err, "Unparseable path segment.");
      AppError::Store(StoreError::not_found("Resource", req.path())).into()
    }));
  configure_app_routes(cfg);
}
