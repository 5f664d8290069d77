// core/src/models/collection.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::FieldErrors;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Collection {
  pub id: i64,
  pub title: String,
  pub products_count: i64,
}

/// Full representation accepted by create and replace.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInput {
  #[serde(default)]
  pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionPatch {
  pub title: Option<String>,
}

impl CollectionInput {
  pub fn validate(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.check_text("title", &self.title, 255);
    errors
  }
}

impl CollectionPatch {
  pub fn apply_to(self, current: &Collection) -> CollectionInput {
    CollectionInput {
      title: self.title.unwrap_or_else(|| current.title.clone()),
    }
  }
}
