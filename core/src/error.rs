// core/src/error.rs
use crate::validation::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Validation failed: {0}")]
  Validation(FieldErrors),

  #[error("{entity} with ID {id} not found")]
  NotFound { entity: &'static str, id: String },

  #[error("Authentication required: {0}")]
  Unauthenticated(String),

  #[error("Permission denied: {0}")]
  PermissionDenied(String),

  #[error("Operation not allowed: {0}")]
  NotAllowed(String),

  #[error("Database error: {source}")]
  Database {
    #[from]
    source: sqlx::Error,
  },

  #[error("Internal storefront error: {0}")]
  Internal(String),
}

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Unauthenticated,
  PermissionDenied,
  NotAllowed,
  Internal,
}

impl StoreError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    StoreError::NotFound {
      entity,
      id: id.to_string(),
    }
  }

  /// A validation error carrying a single field message.
  pub fn invalid(field: &str, message: impl Into<String>) -> Self {
    let mut errors = FieldErrors::new();
    errors.add(field, message);
    StoreError::Validation(errors)
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      StoreError::Validation(_) => ErrorKind::Validation,
      StoreError::NotFound { .. } => ErrorKind::NotFound,
      StoreError::Unauthenticated(_) => ErrorKind::Unauthenticated,
      StoreError::PermissionDenied(_) => ErrorKind::PermissionDenied,
      StoreError::NotAllowed(_) => ErrorKind::NotAllowed,
      StoreError::Database { .. } | StoreError::Internal(_) => ErrorKind::Internal,
    }
  }

  /// Field errors for a validation failure, `None` for every other kind.
  pub fn field_errors(&self) -> Option<&FieldErrors> {
    match self {
      StoreError::Validation(errors) => Some(errors),
      _ => None,
    }
  }
}

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;
