// core/src/models/review.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::FieldErrors;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Review {
  pub id: i64,
  pub product_id: i64,
  pub name: String,
  pub description: String,
  pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
  pub name: Option<String>,
  pub description: Option<String>,
}

impl ReviewInput {
  pub fn validate(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.check_text("name", &self.name, 255);
    errors.check_text("description", &self.description, 10_000);
    errors
  }
}

impl ReviewPatch {
  pub fn apply_to(self, current: &Review) -> ReviewInput {
    ReviewInput {
      name: self.name.unwrap_or_else(|| current.name.clone()),
      description: self.description.unwrap_or_else(|| current.description.clone()),
    }
  }
}
