// core/src/services/mod.rs

//! Domain operations. Each function takes the datastore and, where the
//! operation is guarded, the calling user (`None` for anonymous callers).
//!
//! Order of checks is the same everywhere: permission, then input
//! validation, then existence of referenced records, then the mutation.

pub mod carts;
pub mod catalog;
pub mod customers;
pub mod orders;

use crate::error::{ErrorKind, StoreResult};
use crate::validation::FieldErrors;

/// Records `message` on `field` when `lookup` failed with `NotFound`.
/// Any other failure is propagated.
pub(crate) fn check_reference<T>(
  errors: &mut FieldErrors,
  field: &str,
  lookup: StoreResult<T>,
  message: impl FnOnce() -> String,
) -> StoreResult<()> {
  match lookup {
    Ok(_) => Ok(()),
    Err(e) if e.kind() == ErrorKind::NotFound => {
      errors.add(field, message());
      Ok(())
    }
    Err(e) => Err(e),
  }
}

pub(crate) fn invalid_pk(id: i64) -> String {
  format!("Invalid pk \"{}\" - object does not exist.", id)
}
