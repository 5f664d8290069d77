// core/src/services/customers.rs

use tracing::{info, instrument};

use super::{check_reference, invalid_pk};
use crate::datastore::Datastore;
use crate::error::StoreResult;
use crate::models::{Customer, CustomerInput, CustomerPatch, CustomerProfile, User};
use crate::permissions::{require_admin, require_authenticated};

/// The caller's own customer record, created with defaults on first access.
#[instrument(name = "customers::me", skip(ds, user), err(Display))]
pub async fn me(ds: &dyn Datastore, user: Option<&User>) -> StoreResult<Customer> {
  let user = require_authenticated(user)?;
  ds.ensure_customer(user.id).await
}

#[instrument(name = "customers::update_me", skip(ds, user, profile), err(Display))]
pub async fn update_me(ds: &dyn Datastore, user: Option<&User>, profile: &CustomerProfile) -> StoreResult<Customer> {
  let user = require_authenticated(user)?;
  profile.validate().into_result()?;
  let customer = ds.ensure_customer(user.id).await?;
  ds.update_customer(customer.id, profile).await
}

pub async fn list_customers(ds: &dyn Datastore, user: Option<&User>) -> StoreResult<Vec<Customer>> {
  require_admin(user)?;
  ds.list_customers().await
}

pub async fn get_customer(ds: &dyn Datastore, user: Option<&User>, id: i64) -> StoreResult<Customer> {
  require_admin(user)?;
  ds.get_customer(id).await
}

#[instrument(name = "customers::create", skip(ds, user, input), fields(user_id = input.user_id), err(Display))]
pub async fn create_customer(ds: &dyn Datastore, user: Option<&User>, input: &CustomerInput) -> StoreResult<Customer> {
  require_admin(user)?;
  let mut errors = input.profile.validate();
  check_reference(&mut errors, "user_id", ds.get_user(input.user_id).await, || {
    invalid_pk(input.user_id)
  })?;
  errors.into_result()?;
  let customer = ds.create_customer(input).await?;
  info!(customer_id = customer.id, "Customer created.");
  Ok(customer)
}

pub async fn update_customer(
  ds: &dyn Datastore,
  user: Option<&User>,
  id: i64,
  profile: &CustomerProfile,
) -> StoreResult<Customer> {
  require_admin(user)?;
  ds.get_customer(id).await?;
  profile.validate().into_result()?;
  ds.update_customer(id, profile).await
}

pub async fn patch_customer(
  ds: &dyn Datastore,
  user: Option<&User>,
  id: i64,
  patch: CustomerPatch,
) -> StoreResult<Customer> {
  require_admin(user)?;
  let current = ds.get_customer(id).await?;
  let profile = patch.apply_to(&current);
  profile.validate().into_result()?;
  ds.update_customer(id, &profile).await
}

#[instrument(name = "customers::delete", skip(ds, user), err(Display))]
pub async fn delete_customer(ds: &dyn Datastore, user: Option<&User>, id: i64) -> StoreResult<()> {
  require_admin(user)?;
  ds.delete_customer(id).await
}
