// core/src/permissions.rs

//! Who may do what.
//!
//! Reads of the catalog are public and carts are open to anonymous callers, so
//! those operations never consult this module. Everything else goes through one
//! of the `require_*` guards, which answer with `Unauthenticated` when there is
//! no caller at all and `PermissionDenied` when the caller lacks the role.

use crate::error::{StoreError, StoreResult};
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
  Collection,
  Product,
  Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Add,
  Change,
  Delete,
}

impl Resource {
  fn model_name(self) -> &'static str {
    match self {
      Resource::Collection => "collection",
      Resource::Product => "product",
      Resource::Review => "review",
    }
  }
}

impl Action {
  fn verb(self) -> &'static str {
    match self {
      Action::Add => "add",
      Action::Change => "change",
      Action::Delete => "delete",
    }
  }
}

/// Permission codename, e.g. `add_product`.
pub fn codename(action: Action, resource: Resource) -> String {
  format!("{}_{}", action.verb(), resource.model_name())
}

pub fn require_authenticated(user: Option<&User>) -> StoreResult<&User> {
  user.ok_or_else(|| StoreError::Unauthenticated("Authentication credentials were not provided.".to_string()))
}

pub fn require_admin(user: Option<&User>) -> StoreResult<&User> {
  let user = require_authenticated(user)?;
  if user.is_admin() {
    Ok(user)
  } else {
    Err(StoreError::PermissionDenied(
      "You do not have permission to perform this action.".to_string(),
    ))
  }
}

/// Superusers pass; staff pass when they hold the model permission.
pub fn require_model_permission(user: Option<&User>, action: Action, resource: Resource) -> StoreResult<&User> {
  let user = require_authenticated(user)?;
  let code = codename(action, resource);
  if user.is_superuser || (user.is_staff && user.has_permission(&code)) {
    Ok(user)
  } else {
    tracing::debug!(user_id = user.id, permission = %code, "Model permission check failed.");
    Err(StoreError::PermissionDenied(format!(
      "You do not have the '{}' permission.",
      code
    )))
  }
}
