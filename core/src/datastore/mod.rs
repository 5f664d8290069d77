// core/src/datastore/mod.rs

//! Persistence seam for the storefront.
//!
//! A `Datastore` stores records and enforces the integrity rules that must hold
//! regardless of who calls it: unique cart lines, protected deletes, and the
//! atomic cart-to-order conversion. Input validation and permissions live in
//! `crate::services`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{
  CartDetail, CartLine, Collection, CollectionInput, Customer, CustomerInput, CustomerProfile, NewUser, OrderDetail,
  PaymentStatus, Product, ProductInput, Review, ReviewInput, User,
};
use crate::query::{Page, ProductQuery};

pub mod memory;
pub mod postgres;

pub use memory::MemoryDatastore;
pub use postgres::PgDatastore;

#[async_trait]
pub trait Datastore: Send + Sync + 'static {
  // --- Collections ---
  async fn list_collections(&self) -> StoreResult<Vec<Collection>>;
  async fn get_collection(&self, id: i64) -> StoreResult<Collection>;
  async fn create_collection(&self, input: &CollectionInput) -> StoreResult<Collection>;
  async fn update_collection(&self, id: i64, input: &CollectionInput) -> StoreResult<Collection>;
  /// Fails with `NotAllowed` while any product belongs to the collection.
  async fn delete_collection(&self, id: i64) -> StoreResult<()>;

  // --- Products ---
  async fn list_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>>;
  async fn get_product(&self, id: i64) -> StoreResult<Product>;
  async fn create_product(&self, input: &ProductInput) -> StoreResult<Product>;
  async fn update_product(&self, id: i64, input: &ProductInput) -> StoreResult<Product>;
  /// Fails with `NotAllowed` while any order item references the product.
  async fn delete_product(&self, id: i64) -> StoreResult<()>;

  // --- Reviews (always scoped to their product) ---
  async fn list_reviews(&self, product_id: i64) -> StoreResult<Vec<Review>>;
  async fn get_review(&self, product_id: i64, id: i64) -> StoreResult<Review>;
  async fn create_review(&self, product_id: i64, input: &ReviewInput) -> StoreResult<Review>;
  async fn update_review(&self, product_id: i64, id: i64, input: &ReviewInput) -> StoreResult<Review>;
  async fn delete_review(&self, product_id: i64, id: i64) -> StoreResult<()>;

  // --- Carts ---
  async fn create_cart(&self) -> StoreResult<CartDetail>;
  async fn get_cart(&self, id: Uuid) -> StoreResult<CartDetail>;
  async fn delete_cart(&self, id: Uuid) -> StoreResult<()>;
  /// Upsert keyed by (cart, product): an existing line has its quantity
  /// incremented, otherwise a new line is bound to `cart_id`.
  async fn add_cart_item(&self, cart_id: Uuid, product_id: i64, quantity: i32) -> StoreResult<CartLine>;
  async fn get_cart_item(&self, cart_id: Uuid, item_id: i64) -> StoreResult<CartLine>;
  async fn set_cart_item_quantity(&self, cart_id: Uuid, item_id: i64, quantity: i32) -> StoreResult<CartLine>;
  async fn remove_cart_item(&self, cart_id: Uuid, item_id: i64) -> StoreResult<()>;

  // --- Users and access tokens ---
  async fn create_user(&self, user: &NewUser) -> StoreResult<User>;
  async fn get_user(&self, id: i64) -> StoreResult<User>;
  async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
  async fn store_token(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) -> StoreResult<()>;
  /// The owner of `token` if it exists and has not expired at `now`.
  async fn find_user_by_token(&self, token: &str, now: DateTime<Utc>) -> StoreResult<Option<User>>;

  // --- Customers ---
  async fn list_customers(&self) -> StoreResult<Vec<Customer>>;
  async fn get_customer(&self, id: i64) -> StoreResult<Customer>;
  async fn find_customer_by_user(&self, user_id: i64) -> StoreResult<Option<Customer>>;
  /// Returns the user's customer record, creating a default one if missing.
  async fn ensure_customer(&self, user_id: i64) -> StoreResult<Customer>;
  async fn create_customer(&self, input: &CustomerInput) -> StoreResult<Customer>;
  async fn update_customer(&self, id: i64, profile: &CustomerProfile) -> StoreResult<Customer>;
  /// Fails with `NotAllowed` while the customer owns orders.
  async fn delete_customer(&self, id: i64) -> StoreResult<()>;

  // --- Orders ---
  /// All orders, or only those of `customer_id` when given. Newest first.
  async fn list_orders(&self, customer_id: Option<i64>) -> StoreResult<Vec<OrderDetail>>;
  async fn get_order(&self, id: i64) -> StoreResult<OrderDetail>;
  /// Converts a cart into a pending order owned by `customer_id`, atomically:
  /// the order, one item per cart line at the product's current price, and the
  /// deletion of the cart commit together or not at all.
  ///
  /// Fails with `NotFound` when the cart does not exist (including when a
  /// concurrent conversion deleted it first) and with `Validation` on
  /// `cart_id` when the cart has no items.
  async fn place_order(&self, cart_id: Uuid, customer_id: i64) -> StoreResult<OrderDetail>;
  async fn set_payment_status(&self, id: i64, status: PaymentStatus) -> StoreResult<OrderDetail>;
  /// Deletes the order and its items.
  async fn delete_order(&self, id: i64) -> StoreResult<()>;
}

pub(crate) const EMPTY_CART: &str = "The cart is empty.";
