// core/src/validation.rs

//! Field-level validation errors, rendered as `{"field": ["message", ...]}`.

use crate::error::{StoreError, StoreResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const BLANK: &str = "This field may not be blank.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_string()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }

  pub fn contains(&self, field: &str) -> bool {
    self.0.contains_key(field)
  }

  /// `Ok(())` when nothing was recorded, otherwise a `StoreError::Validation`.
  pub fn into_result(self) -> StoreResult<()> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(StoreError::Validation(self))
    }
  }

  /// Rejects blank text and text longer than `max_len` characters.
  pub fn check_text(&mut self, field: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
      self.add(field, BLANK);
    } else if value.chars().count() > max_len {
      self.add(
        field,
        format!("Ensure this field has no more than {} characters.", max_len),
      );
    }
  }

  pub fn check_min(&mut self, field: &str, value: i64, min: i64) {
    if value < min {
      self.add(
        field,
        format!("Ensure this value is greater than or equal to {}.", min),
      );
    }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      if !first {
        write!(f, "; ")?;
      }
      first = false;
      write!(f, "{}: {}", field, messages.join(" "))?;
    }
    Ok(())
  }
}
