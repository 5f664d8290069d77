// core/src/lib.rs

//! Storefront: the catalog, cart and order domain behind the storefront REST API.
//!
//! The crate is split the same way requests flow through it:
//!  - `models` holds the records and the request inputs that create or change them.
//!  - `services` validates inputs, enforces permissions and calls a datastore.
//!  - `datastore` persists records, either in memory or in PostgreSQL.
//!
//! Every operation returns `StoreResult<T>`. The HTTP layer maps `StoreError::kind()`
//! to a status code, so services never deal with transport details.
//!
//! The one operation with transactional subtlety is the cart-to-order conversion
//! (`services::orders::place_order`, backed by `Datastore::place_order`): the order,
//! its items and the deletion of the cart are committed together, and two concurrent
//! conversions of the same cart cannot both succeed.

pub mod datastore;
pub mod error;
pub mod models;
pub mod permissions;
pub mod query;
pub mod services;
pub mod validation;

pub use crate::datastore::{Datastore, MemoryDatastore, PgDatastore};
pub use crate::error::{ErrorKind, StoreError, StoreResult};
pub use crate::permissions::{Action, Resource};
pub use crate::query::{OrderField, Page, Pagination, ProductOrdering, ProductQuery};
pub use crate::validation::FieldErrors;
