// core/src/models/customer.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};

use crate::validation::FieldErrors;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "membership_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Membership {
  #[default]
  Bronze,
  Silver,
  Gold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Customer {
  pub id: i64,
  pub user_id: i64,
  pub phone: String,
  pub birth_date: Option<NaiveDate>,
  pub membership: Membership,
}

/// The fields a customer may edit about themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerProfile {
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub birth_date: Option<NaiveDate>,
  #[serde(default)]
  pub membership: Membership,
}

/// Administrator-side creation, binding a profile to an existing user.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInput {
  pub user_id: i64,
  #[serde(flatten)]
  pub profile: CustomerProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerPatch {
  pub phone: Option<String>,
  pub birth_date: Option<NaiveDate>,
  pub membership: Option<Membership>,
}

impl CustomerProfile {
  pub fn validate(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if self.phone.chars().count() > 255 {
      errors.add("phone", "Ensure this field has no more than 255 characters.");
    }
    errors
  }

  pub fn of(customer: &Customer) -> Self {
    CustomerProfile {
      phone: customer.phone.clone(),
      birth_date: customer.birth_date,
      membership: customer.membership,
    }
  }
}

impl CustomerPatch {
  pub fn apply_to(self, current: &Customer) -> CustomerProfile {
    CustomerProfile {
      phone: self.phone.unwrap_or_else(|| current.phone.clone()),
      birth_date: self.birth_date.or(current.birth_date),
      membership: self.membership.unwrap_or(current.membership),
    }
  }
}
