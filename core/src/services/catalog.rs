// core/src/services/catalog.rs

//! Collections, products and their reviews.
//!
//! Reads are public. Catalog mutations need the matching model permission;
//! reviews may be posted by anyone but only changed or removed by staff.

use tracing::{info, instrument};

use super::{check_reference, invalid_pk};
use crate::datastore::Datastore;
use crate::error::StoreResult;
use crate::models::{
  Collection, CollectionInput, CollectionPatch, ProductInput, ProductPatch, ProductView, Review, ReviewInput,
  ReviewPatch, User,
};
use crate::permissions::{require_model_permission, Action, Resource};
use crate::query::{Page, ProductQuery};

// --- Collections ---

pub async fn list_collections(ds: &dyn Datastore) -> StoreResult<Vec<Collection>> {
  ds.list_collections().await
}

pub async fn get_collection(ds: &dyn Datastore, id: i64) -> StoreResult<Collection> {
  ds.get_collection(id).await
}

#[instrument(name = "catalog::create_collection", skip(ds, user, input), err(Display))]
pub async fn create_collection(
  ds: &dyn Datastore,
  user: Option<&User>,
  input: &CollectionInput,
) -> StoreResult<Collection> {
  require_model_permission(user, Action::Add, Resource::Collection)?;
  input.validate().into_result()?;
  let collection = ds.create_collection(input).await?;
  info!(collection_id = collection.id, "Collection created.");
  Ok(collection)
}

#[instrument(name = "catalog::update_collection", skip(ds, user, input), err(Display))]
pub async fn update_collection(
  ds: &dyn Datastore,
  user: Option<&User>,
  id: i64,
  input: &CollectionInput,
) -> StoreResult<Collection> {
  require_model_permission(user, Action::Change, Resource::Collection)?;
  input.validate().into_result()?;
  ds.update_collection(id, input).await
}

pub async fn patch_collection(
  ds: &dyn Datastore,
  user: Option<&User>,
  id: i64,
  patch: CollectionPatch,
) -> StoreResult<Collection> {
  require_model_permission(user, Action::Change, Resource::Collection)?;
  let current = ds.get_collection(id).await?;
  let input = patch.apply_to(&current);
  update_collection(ds, user, id, &input).await
}

#[instrument(name = "catalog::delete_collection", skip(ds, user), err(Display))]
pub async fn delete_collection(ds: &dyn Datastore, user: Option<&User>, id: i64) -> StoreResult<()> {
  require_model_permission(user, Action::Delete, Resource::Collection)?;
  ds.delete_collection(id).await?;
  info!(collection_id = id, "Collection deleted.");
  Ok(())
}

// --- Products ---

#[instrument(name = "catalog::list_products", skip(ds, query), fields(limit = query.page.limit, offset = query.page.offset))]
pub async fn list_products(ds: &dyn Datastore, query: &ProductQuery) -> StoreResult<Page<ProductView>> {
  let page = ds.list_products(query).await?;
  Ok(page.map(ProductView::from))
}

pub async fn get_product(ds: &dyn Datastore, id: i64) -> StoreResult<ProductView> {
  ds.get_product(id).await.map(ProductView::from)
}

async fn validate_product(ds: &dyn Datastore, input: &ProductInput) -> StoreResult<()> {
  let mut errors = input.validate();
  check_reference(
    &mut errors,
    "collection_id",
    ds.get_collection(input.collection_id).await,
    || invalid_pk(input.collection_id),
  )?;
  errors.into_result()
}

#[instrument(name = "catalog::create_product", skip(ds, user, input), fields(slug = %input.slug), err(Display))]
pub async fn create_product(ds: &dyn Datastore, user: Option<&User>, input: &ProductInput) -> StoreResult<ProductView> {
  require_model_permission(user, Action::Add, Resource::Product)?;
  validate_product(ds, input).await?;
  let product = ds.create_product(input).await?;
  info!(product_id = product.id, "Product created.");
  Ok(product.into())
}

#[instrument(name = "catalog::update_product", skip(ds, user, input), err(Display))]
pub async fn update_product(
  ds: &dyn Datastore,
  user: Option<&User>,
  id: i64,
  input: &ProductInput,
) -> StoreResult<ProductView> {
  require_model_permission(user, Action::Change, Resource::Product)?;
  // 404 before 400 for an unknown product.
  ds.get_product(id).await?;
  validate_product(ds, input).await?;
  ds.update_product(id, input).await.map(ProductView::from)
}

pub async fn patch_product(
  ds: &dyn Datastore,
  user: Option<&User>,
  id: i64,
  patch: ProductPatch,
) -> StoreResult<ProductView> {
  require_model_permission(user, Action::Change, Resource::Product)?;
  let current = ds.get_product(id).await?;
  let input = patch.apply_to(&current);
  update_product(ds, user, id, &input).await
}

#[instrument(name = "catalog::delete_product", skip(ds, user), err(Display))]
pub async fn delete_product(ds: &dyn Datastore, user: Option<&User>, id: i64) -> StoreResult<()> {
  require_model_permission(user, Action::Delete, Resource::Product)?;
  ds.delete_product(id).await?;
  info!(product_id = id, "Product deleted.");
  Ok(())
}

// --- Reviews ---

pub async fn list_reviews(ds: &dyn Datastore, product_id: i64) -> StoreResult<Vec<Review>> {
  ds.list_reviews(product_id).await
}

pub async fn get_review(ds: &dyn Datastore, product_id: i64, id: i64) -> StoreResult<Review> {
  ds.get_review(product_id, id).await
}

/// Open to anonymous callers.
#[instrument(name = "catalog::create_review", skip(ds, input), err(Display))]
pub async fn create_review(ds: &dyn Datastore, product_id: i64, input: &ReviewInput) -> StoreResult<Review> {
  ds.get_product(product_id).await?;
  input.validate().into_result()?;
  ds.create_review(product_id, input).await
}

#[instrument(name = "catalog::update_review", skip(ds, user, input), err(Display))]
pub async fn update_review(
  ds: &dyn Datastore,
  user: Option<&User>,
  product_id: i64,
  id: i64,
  input: &ReviewInput,
) -> StoreResult<Review> {
  require_model_permission(user, Action::Change, Resource::Review)?;
  input.validate().into_result()?;
  ds.update_review(product_id, id, input).await
}

pub async fn patch_review(
  ds: &dyn Datastore,
  user: Option<&User>,
  product_id: i64,
  id: i64,
  patch: ReviewPatch,
) -> StoreResult<Review> {
  require_model_permission(user, Action::Change, Resource::Review)?;
  let current = ds.get_review(product_id, id).await?;
  let input = patch.apply_to(&current);
  update_review(ds, user, product_id, id, &input).await
}

#[instrument(name = "catalog::delete_review", skip(ds, user), err(Display))]
pub async fn delete_review(ds: &dyn Datastore, user: Option<&User>, product_id: i64, id: i64) -> StoreResult<()> {
  require_model_permission(user, Action::Delete, Resource::Review)?;
  ds.delete_review(product_id, id).await
}
