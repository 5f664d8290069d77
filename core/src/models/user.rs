// core/src/models/user.rs

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub is_staff: bool,
  pub is_superuser: bool,
  /// Model permission codenames such as `add_product` or `delete_collection`.
  pub permissions: Vec<String>,
}

impl User {
  pub fn is_admin(&self) -> bool {
    self.is_staff || self.is_superuser
  }

  pub fn has_permission(&self, codename: &str) -> bool {
    self.is_superuser || self.permissions.iter().any(|p| p == codename)
  }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
  pub username: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub password_hash: String,
  pub is_staff: bool,
  pub is_superuser: bool,
  pub permissions: Vec<String>,
}
