// apps/storefront_api/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront::{ErrorKind, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  /// Body, query string or header that could not be parsed at all.
  #[error("Malformed Request: {0}")]
  BadRequest(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Store(e) => match e.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::NotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with error");
    }

    let mut response = HttpResponse::build(status);
    match self {
      AppError::Store(StoreError::Validation(fields)) => response.json(fields),
      AppError::Store(StoreError::NotFound { .. }) => response.json(json!({"detail": "Not found."})),
      AppError::Store(StoreError::Unauthenticated(m) | StoreError::PermissionDenied(m) | StoreError::NotAllowed(m)) => {
        response.json(json!({"detail": m}))
      }
      AppError::Auth(m) | AppError::BadRequest(m) => response.json(json!({"detail": m})),
      // Datastore, configuration and internal failures never leak their detail.
      AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
        response.json(json!({"detail": "A server error occurred."}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
