// core/src/datastore/postgres.rs

//! PostgreSQL `Datastore` built on sqlx runtime queries.
//!
//! Protected deletes rely on `ON DELETE RESTRICT` foreign keys: the single
//! `DELETE` either succeeds or raises a foreign-key violation that is reported
//! as `NotAllowed`. The cart-to-order conversion runs in one transaction that
//! locks the cart row first, so concurrent conversions serialize on that lock.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{Datastore, EMPTY_CART};
use crate::error::{StoreError, StoreResult};
use crate::models::{
  Cart, CartDetail, CartLine, Collection, CollectionInput, Customer, CustomerInput, CustomerProfile, NewUser, Order,
  OrderDetail, OrderItem, PaymentStatus, Product, ProductInput, Review, ReviewInput, SimpleProduct, User,
};
use crate::models::cart::QUANTITY_OVERFLOW;
use crate::query::{Page, ProductQuery};

const COLLECTION_SELECT: &str = "SELECT c.id, c.title, \
  (SELECT COUNT(*) FROM products p WHERE p.collection_id = c.id) AS products_count \
  FROM collections c";
const PRODUCT_COLUMNS: &str =
  "id, title, slug, description, unit_price_cents, inventory, collection_id, last_update";
const REVIEW_COLUMNS: &str = "id, product_id, name, description, date";
const USER_COLUMNS: &str =
  "u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash, u.is_staff, u.is_superuser, u.permissions";
const CUSTOMER_COLUMNS: &str = "id, user_id, phone, birth_date, membership";
const ORDER_COLUMNS: &str = "id, customer_id, placed_at, payment_status";
const CART_LINE_SELECT: &str = "SELECT ci.id, ci.quantity, p.id AS product_id, p.title AS product_title, \
  p.unit_price_cents FROM cart_items ci JOIN products p ON p.id = ci.product_id";
const ORDER_ITEM_SELECT: &str = "SELECT oi.id, oi.order_id, oi.quantity, oi.unit_price_cents, \
  p.id AS product_id, p.title AS product_title, p.unit_price_cents AS product_unit_price_cents \
  FROM order_items oi JOIN products p ON p.id = oi.product_id";

#[derive(Debug, FromRow)]
struct CartLineRow {
  id: i64,
  quantity: i32,
  product_id: i64,
  product_title: String,
  unit_price_cents: i64,
}

impl From<CartLineRow> for CartLine {
  fn from(row: CartLineRow) -> Self {
    CartLine::new(
      row.id,
      SimpleProduct {
        id: row.product_id,
        title: row.product_title,
        unit_price_cents: row.unit_price_cents,
      },
      row.quantity,
    )
  }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
  id: i64,
  order_id: i64,
  quantity: i32,
  unit_price_cents: i64,
  product_id: i64,
  product_title: String,
  product_unit_price_cents: i64,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      product: SimpleProduct {
        id: row.product_id,
        title: row.product_title,
        unit_price_cents: row.product_unit_price_cents,
      },
      quantity: row.quantity,
      unit_price_cents: row.unit_price_cents,
    }
  }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
  err
    .as_database_error()
    .map(|db| db.is_foreign_key_violation())
    .unwrap_or(false)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  err
    .as_database_error()
    .map(|db| db.is_unique_violation())
    .unwrap_or(false)
}

// SQLSTATE 22003, raised when the upserted quantity leaves the INTEGER range.
fn is_numeric_out_of_range(err: &sqlx::Error) -> bool {
  err
    .as_database_error()
    .and_then(|db| db.code())
    .map(|code| code == "22003")
    .unwrap_or(false)
}

/// Escapes `%`, `_` and `\` so a search term matches literally under ILIKE.
fn like_pattern(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len() + 2);
  escaped.push('%');
  for ch in term.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped.push('%');
  escaped
}

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
  qb.push(" WHERE TRUE");
  if let Some(collection_id) = query.collection_id {
    qb.push(" AND collection_id = ").push_bind(collection_id);
  }
  if let Some(gt) = query.unit_price_gt {
    qb.push(" AND unit_price_cents > ").push_bind(gt);
  }
  if let Some(lt) = query.unit_price_lt {
    qb.push(" AND unit_price_cents < ").push_bind(lt);
  }
  if let Some(term) = query.search_term() {
    let pattern = like_pattern(term);
    qb.push(" AND (title ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR description ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
}

#[derive(Debug, Clone)]
pub struct PgDatastore {
  pool: PgPool,
}

impl PgDatastore {
  pub fn new(pool: PgPool) -> Self {
    PgDatastore { pool }
  }

  /// Connects a pool to `database_url`.
  pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await
      .context("failed to connect to Postgres")?;
    Ok(PgDatastore { pool })
  }

  /// Runs the embedded migrations under `core/migrations`.
  pub async fn migrate(&self) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .context("storefront migrations failed")?;
    Ok(())
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  async fn require_cart(&self, id: Uuid) -> StoreResult<Cart> {
    sqlx::query_as::<_, Cart>("SELECT id, created_at FROM carts WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::not_found("Cart", id))
  }

  async fn require_product(&self, id: i64) -> StoreResult<()> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    found.map(|_| ()).ok_or_else(|| StoreError::not_found("Product", id))
  }

  async fn cart_line(&self, cart_id: Uuid, item_id: i64) -> StoreResult<CartLine> {
    let sql = format!("{} WHERE ci.cart_id = $1 AND ci.id = $2", CART_LINE_SELECT);
    sqlx::query_as::<_, CartLineRow>(&sql)
      .bind(cart_id)
      .bind(item_id)
      .fetch_optional(&self.pool)
      .await?
      .map(CartLine::from)
      .ok_or_else(|| StoreError::not_found("Cart item", item_id))
  }

  async fn order_items(&self, order_ids: &[i64]) -> StoreResult<HashMap<i64, Vec<OrderItem>>> {
    let sql = format!("{} WHERE oi.order_id = ANY($1) ORDER BY oi.id", ORDER_ITEM_SELECT);
    let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
      .bind(order_ids.to_vec())
      .fetch_all(&self.pool)
      .await?;
    let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for row in rows {
      grouped.entry(row.order_id).or_default().push(OrderItem::from(row));
    }
    Ok(grouped)
  }

  async fn with_items(&self, orders: Vec<Order>) -> StoreResult<Vec<OrderDetail>> {
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let mut items = self.order_items(&ids).await?;
    Ok(
      orders
        .into_iter()
        .map(|order| {
          let lines = items.remove(&order.id).unwrap_or_default();
          OrderDetail::assemble(order, lines)
        })
        .collect(),
    )
  }
}

#[async_trait]
impl Datastore for PgDatastore {
  async fn list_collections(&self) -> StoreResult<Vec<Collection>> {
    let sql = format!("{} ORDER BY c.id", COLLECTION_SELECT);
    Ok(sqlx::query_as::<_, Collection>(&sql).fetch_all(&self.pool).await?)
  }

  async fn get_collection(&self, id: i64) -> StoreResult<Collection> {
    let sql = format!("{} WHERE c.id = $1", COLLECTION_SELECT);
    sqlx::query_as::<_, Collection>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::not_found("Collection", id))
  }

  async fn create_collection(&self, input: &CollectionInput) -> StoreResult<Collection> {
    Ok(
      sqlx::query_as::<_, Collection>(
        "INSERT INTO collections (title) VALUES ($1) RETURNING id, title, 0::BIGINT AS products_count",
      )
      .bind(&input.title)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  async fn update_collection(&self, id: i64, input: &CollectionInput) -> StoreResult<Collection> {
    let updated = sqlx::query("UPDATE collections SET title = $2 WHERE id = $1")
      .bind(id)
      .bind(&input.title)
      .execute(&self.pool)
      .await?;
    if updated.rows_affected() == 0 {
      return Err(StoreError::not_found("Collection", id));
    }
    self.get_collection(id).await
  }

  async fn delete_collection(&self, id: i64) -> StoreResult<()> {
    match sqlx::query("DELETE FROM collections WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
    {
      Ok(done) if done.rows_affected() == 0 => Err(StoreError::not_found("Collection", id)),
      Ok(_) => Ok(()),
      Err(e) if is_foreign_key_violation(&e) => Err(StoreError::NotAllowed(
        "Collection cannot be deleted because it includes one or more products.".to_string(),
      )),
      Err(e) => Err(e.into()),
    }
  }

  #[instrument(name = "pg::list_products", skip(self, query), err(Display))]
  async fn list_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
    push_product_filters(&mut count_qb, query);
    let (count,): (i64,) = count_qb.build_query_as().fetch_one(&self.pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
    push_product_filters(&mut qb, query);
    qb.push(format!(
      " ORDER BY {} {}, id ASC LIMIT ",
      query.ordering.field.column(),
      if query.ordering.descending { "DESC" } else { "ASC" }
    ))
    .push_bind(i64::from(query.page.limit))
    .push(" OFFSET ")
    .push_bind(i64::from(query.page.offset));
    let results = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

    Ok(Page {
      count: count.max(0) as u64,
      limit: query.page.limit,
      offset: query.page.offset,
      results,
    })
  }

  async fn get_product(&self, id: i64) -> StoreResult<Product> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    sqlx::query_as::<_, Product>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::not_found("Product", id))
  }

  async fn create_product(&self, input: &ProductInput) -> StoreResult<Product> {
    let sql = format!(
      "INSERT INTO products (title, slug, description, unit_price_cents, inventory, collection_id) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
      PRODUCT_COLUMNS
    );
    sqlx::query_as::<_, Product>(&sql)
      .bind(&input.title)
      .bind(&input.slug)
      .bind(&input.description)
      .bind(input.unit_price_cents)
      .bind(input.inventory)
      .bind(input.collection_id)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| {
        if is_foreign_key_violation(&e) {
          StoreError::not_found("Collection", input.collection_id)
        } else {
          e.into()
        }
      })
  }

  async fn update_product(&self, id: i64, input: &ProductInput) -> StoreResult<Product> {
    let sql = format!(
      "UPDATE products SET title = $2, slug = $3, description = $4, unit_price_cents = $5, \
       inventory = $6, collection_id = $7, last_update = NOW() WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    );
    sqlx::query_as::<_, Product>(&sql)
      .bind(id)
      .bind(&input.title)
      .bind(&input.slug)
      .bind(&input.description)
      .bind(input.unit_price_cents)
      .bind(input.inventory)
      .bind(input.collection_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| {
        if is_foreign_key_violation(&e) {
          StoreError::not_found("Collection", input.collection_id)
        } else {
          StoreError::from(e)
        }
      })?
      .ok_or_else(|| StoreError::not_found("Product", id))
  }

  async fn delete_product(&self, id: i64) -> StoreResult<()> {
    match sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
    {
      Ok(done) if done.rows_affected() == 0 => Err(StoreError::not_found("Product", id)),
      Ok(_) => Ok(()),
      Err(e) if is_foreign_key_violation(&e) => Err(StoreError::NotAllowed(
        "Product cannot be deleted because it is associated with an order item.".to_string(),
      )),
      Err(e) => Err(e.into()),
    }
  }

  async fn list_reviews(&self, product_id: i64) -> StoreResult<Vec<Review>> {
    self.require_product(product_id).await?;
    let sql = format!("SELECT {} FROM reviews WHERE product_id = $1 ORDER BY id", REVIEW_COLUMNS);
    Ok(
      sqlx::query_as::<_, Review>(&sql)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn get_review(&self, product_id: i64, id: i64) -> StoreResult<Review> {
    let sql = format!("SELECT {} FROM reviews WHERE product_id = $1 AND id = $2", REVIEW_COLUMNS);
    sqlx::query_as::<_, Review>(&sql)
      .bind(product_id)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::not_found("Review", id))
  }

  async fn create_review(&self, product_id: i64, input: &ReviewInput) -> StoreResult<Review> {
    let sql = format!(
      "INSERT INTO reviews (product_id, name, description) VALUES ($1, $2, $3) RETURNING {}",
      REVIEW_COLUMNS
    );
    sqlx::query_as::<_, Review>(&sql)
      .bind(product_id)
      .bind(&input.name)
      .bind(&input.description)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| {
        if is_foreign_key_violation(&e) {
          StoreError::not_found("Product", product_id)
        } else {
          e.into()
        }
      })
  }

  async fn update_review(&self, product_id: i64, id: i64, input: &ReviewInput) -> StoreResult<Review> {
    let sql = format!(
      "UPDATE reviews SET name = $3, description = $4 WHERE product_id = $1 AND id = $2 RETURNING {}",
      REVIEW_COLUMNS
    );
    sqlx::query_as::<_, Review>(&sql)
      .bind(product_id)
      .bind(id)
      .bind(&input.name)
      .bind(&input.description)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::not_found("Review", id))
  }

  async fn delete_review(&self, product_id: i64, id: i64) -> StoreResult<()> {
    let done = sqlx::query("DELETE FROM reviews WHERE product_id = $1 AND id = $2")
      .bind(product_id)
      .bind(id)
      .execute(&self.pool)
      .await?;
    if done.rows_affected() == 0 {
      return Err(StoreError::not_found("Review", id));
    }
    Ok(())
  }

  async fn create_cart(&self) -> StoreResult<CartDetail> {
    let cart = sqlx::query_as::<_, Cart>("INSERT INTO carts (id) VALUES ($1) RETURNING id, created_at")
      .bind(Uuid::new_v4())
      .fetch_one(&self.pool)
      .await?;
    Ok(CartDetail::assemble(cart, Vec::new()))
  }

  async fn get_cart(&self, id: Uuid) -> StoreResult<CartDetail> {
    let cart = self.require_cart(id).await?;
    let sql = format!("{} WHERE ci.cart_id = $1 ORDER BY ci.id", CART_LINE_SELECT);
    let lines = sqlx::query_as::<_, CartLineRow>(&sql)
      .bind(id)
      .fetch_all(&self.pool)
      .await?
      .into_iter()
      .map(CartLine::from)
      .collect();
    Ok(CartDetail::assemble(cart, lines))
  }

  async fn delete_cart(&self, id: Uuid) -> StoreResult<()> {
    let done = sqlx::query("DELETE FROM carts WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    if done.rows_affected() == 0 {
      return Err(StoreError::not_found("Cart", id));
    }
    Ok(())
  }

  #[instrument(name = "pg::add_cart_item", skip(self), err(Display))]
  async fn add_cart_item(&self, cart_id: Uuid, product_id: i64, quantity: i32) -> StoreResult<CartLine> {
    self.require_cart(cart_id).await?;
    self.require_product(product_id).await?;

    // The conflict target keeps one line per (cart, product); the inserted row
    // always carries the cart from the request.
    let inserted: Result<(i64,), sqlx::Error> = sqlx::query_as(
      "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3) \
       ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
       RETURNING id",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await;

    let (item_id,) = match inserted {
      Ok(row) => row,
      // The cart was converted or deleted between the existence check and the insert.
      Err(e) if is_foreign_key_violation(&e) => return Err(StoreError::not_found("Cart", cart_id)),
      Err(e) if is_numeric_out_of_range(&e) => return Err(StoreError::invalid("quantity", QUANTITY_OVERFLOW)),
      Err(e) => return Err(e.into()),
    };
    self.cart_line(cart_id, item_id).await
  }

  async fn get_cart_item(&self, cart_id: Uuid, item_id: i64) -> StoreResult<CartLine> {
    self.require_cart(cart_id).await?;
    self.cart_line(cart_id, item_id).await
  }

  async fn set_cart_item_quantity(&self, cart_id: Uuid, item_id: i64, quantity: i32) -> StoreResult<CartLine> {
    self.require_cart(cart_id).await?;
    let done = sqlx::query("UPDATE cart_items SET quantity = $3 WHERE cart_id = $1 AND id = $2")
      .bind(cart_id)
      .bind(item_id)
      .bind(quantity)
      .execute(&self.pool)
      .await?;
    if done.rows_affected() == 0 {
      return Err(StoreError::not_found("Cart item", item_id));
    }
    self.cart_line(cart_id, item_id).await
  }

  async fn remove_cart_item(&self, cart_id: Uuid, item_id: i64) -> StoreResult<()> {
    self.require_cart(cart_id).await?;
    let done = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND id = $2")
      .bind(cart_id)
      .bind(item_id)
      .execute(&self.pool)
      .await?;
    if done.rows_affected() == 0 {
      return Err(StoreError::not_found("Cart item", item_id));
    }
    Ok(())
  }

  async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
    let sql = format!(
      "INSERT INTO users AS u (username, email, first_name, last_name, password_hash, is_staff, is_superuser, permissions) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
      USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
      .bind(&user.username)
      .bind(&user.email)
      .bind(&user.first_name)
      .bind(&user.last_name)
      .bind(&user.password_hash)
      .bind(user.is_staff)
      .bind(user.is_superuser)
      .bind(&user.permissions)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          StoreError::invalid("username", "A user with that username already exists.")
        } else {
          e.into()
        }
      })
  }

  async fn get_user(&self, id: i64) -> StoreResult<User> {
    let sql = format!("SELECT {} FROM users u WHERE u.id = $1", USER_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::not_found("User", id))
  }

  async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {} FROM users u WHERE u.username = $1", USER_COLUMNS);
    Ok(
      sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn store_token(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) -> StoreResult<()> {
    sqlx::query("INSERT INTO auth_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
      .bind(token)
      .bind(user_id)
      .bind(expires_at)
      .execute(&self.pool)
      .await
      .map_err(|e| {
        if is_foreign_key_violation(&e) {
          StoreError::not_found("User", user_id)
        } else {
          StoreError::from(e)
        }
      })?;
    Ok(())
  }

  async fn find_user_by_token(&self, token: &str, now: DateTime<Utc>) -> StoreResult<Option<User>> {
    let sql = format!(
      "SELECT {} FROM auth_tokens t JOIN users u ON u.id = t.user_id WHERE t.token = $1 AND t.expires_at > $2",
      USER_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, User>(&sql)
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
    let sql = format!("SELECT {} FROM customers ORDER BY id", CUSTOMER_COLUMNS);
    Ok(sqlx::query_as::<_, Customer>(&sql).fetch_all(&self.pool).await?)
  }

  async fn get_customer(&self, id: i64) -> StoreResult<Customer> {
    let sql = format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS);
    sqlx::query_as::<_, Customer>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::not_found("Customer", id))
  }

  async fn find_customer_by_user(&self, user_id: i64) -> StoreResult<Option<Customer>> {
    let sql = format!("SELECT {} FROM customers WHERE user_id = $1", CUSTOMER_COLUMNS);
    Ok(
      sqlx::query_as::<_, Customer>(&sql)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn ensure_customer(&self, user_id: i64) -> StoreResult<Customer> {
    let created = sqlx::query("INSERT INTO customers (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
      .bind(user_id)
      .execute(&self.pool)
      .await
      .map_err(|e| {
        if is_foreign_key_violation(&e) {
          StoreError::not_found("User", user_id)
        } else {
          StoreError::from(e)
        }
      })?;
    if created.rows_affected() == 1 {
      info!(user_id, "Created customer record.");
    }
    self
      .find_customer_by_user(user_id)
      .await?
      .ok_or_else(|| StoreError::Internal(format!("customer for user {} missing after upsert", user_id)))
  }

  async fn create_customer(&self, input: &CustomerInput) -> StoreResult<Customer> {
    let sql = format!(
      "INSERT INTO customers (user_id, phone, birth_date, membership) VALUES ($1, $2, $3, $4) RETURNING {}",
      CUSTOMER_COLUMNS
    );
    sqlx::query_as::<_, Customer>(&sql)
      .bind(input.user_id)
      .bind(&input.profile.phone)
      .bind(input.profile.birth_date)
      .bind(input.profile.membership)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          StoreError::invalid("user_id", "customer with this user already exists.")
        } else if is_foreign_key_violation(&e) {
          StoreError::invalid(
            "user_id",
            format!("Invalid pk \"{}\" - object does not exist.", input.user_id),
          )
        } else {
          e.into()
        }
      })
  }

  async fn update_customer(&self, id: i64, profile: &CustomerProfile) -> StoreResult<Customer> {
    let sql = format!(
      "UPDATE customers SET phone = $2, birth_date = $3, membership = $4 WHERE id = $1 RETURNING {}",
      CUSTOMER_COLUMNS
    );
    sqlx::query_as::<_, Customer>(&sql)
      .bind(id)
      .bind(&profile.phone)
      .bind(profile.birth_date)
      .bind(profile.membership)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::not_found("Customer", id))
  }

  async fn delete_customer(&self, id: i64) -> StoreResult<()> {
    match sqlx::query("DELETE FROM customers WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
    {
      Ok(done) if done.rows_affected() == 0 => Err(StoreError::not_found("Customer", id)),
      Ok(_) => Ok(()),
      Err(e) if is_foreign_key_violation(&e) => Err(StoreError::NotAllowed(
        "Customer cannot be deleted because they have placed orders.".to_string(),
      )),
      Err(e) => Err(e.into()),
    }
  }

  async fn list_orders(&self, customer_id: Option<i64>) -> StoreResult<Vec<OrderDetail>> {
    let orders = match customer_id {
      Some(customer_id) => {
        let sql = format!(
          "SELECT {} FROM orders WHERE customer_id = $1 ORDER BY id DESC",
          ORDER_COLUMNS
        );
        sqlx::query_as::<_, Order>(&sql)
          .bind(customer_id)
          .fetch_all(&self.pool)
          .await?
      }
      None => {
        let sql = format!("SELECT {} FROM orders ORDER BY id DESC", ORDER_COLUMNS);
        sqlx::query_as::<_, Order>(&sql).fetch_all(&self.pool).await?
      }
    };
    self.with_items(orders).await
  }

  async fn get_order(&self, id: i64) -> StoreResult<OrderDetail> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let order = sqlx::query_as::<_, Order>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::not_found("Order", id))?;
    let mut details = self.with_items(vec![order]).await?;
    details
      .pop()
      .ok_or_else(|| StoreError::Internal(format!("order {} lost while loading items", id)))
  }

  #[instrument(name = "pg::place_order", skip(self), fields(cart_id = %cart_id, customer_id), err(Display))]
  async fn place_order(&self, cart_id: Uuid, customer_id: i64) -> StoreResult<OrderDetail> {
    // Dropping `tx` on any early return rolls the whole conversion back.
    let mut tx = self.pool.begin().await?;

    // Linearization point: a concurrent converter blocks here until we commit,
    // then re-reads the row, finds it deleted and gets NotFound.
    let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
      .bind(cart_id)
      .fetch_optional(&mut *tx)
      .await?;
    if locked.is_none() {
      return Err(StoreError::not_found("Cart", cart_id));
    }

    let lines: Vec<(i64, i32, i64)> = sqlx::query_as(
      "SELECT ci.product_id, ci.quantity, p.unit_price_cents \
       FROM cart_items ci JOIN products p ON p.id = ci.product_id \
       WHERE ci.cart_id = $1 ORDER BY ci.id FOR UPDATE OF ci",
    )
    .bind(cart_id)
    .fetch_all(&mut *tx)
    .await?;
    if lines.is_empty() {
      return Err(StoreError::invalid("cart_id", EMPTY_CART));
    }

    let order_sql = format!(
      "INSERT INTO orders (customer_id, payment_status) VALUES ($1, $2) RETURNING {}",
      ORDER_COLUMNS
    );
    let order = sqlx::query_as::<_, Order>(&order_sql)
      .bind(customer_id)
      .bind(PaymentStatus::Pending)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| {
        if is_foreign_key_violation(&e) {
          StoreError::not_found("Customer", customer_id)
        } else {
          StoreError::from(e)
        }
      })?;

    let product_ids: Vec<i64> = lines.iter().map(|l| l.0).collect();
    let quantities: Vec<i32> = lines.iter().map(|l| l.1).collect();
    let unit_prices: Vec<i64> = lines.iter().map(|l| l.2).collect();
    sqlx::query(
      "INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents) \
       SELECT $1, line.product_id, line.quantity, line.unit_price_cents \
       FROM UNNEST($2::BIGINT[], $3::INTEGER[], $4::BIGINT[]) AS line(product_id, quantity, unit_price_cents)",
    )
    .bind(order.id)
    .bind(&product_ids)
    .bind(&quantities)
    .bind(&unit_prices)
    .execute(&mut *tx)
    .await?;

    let deleted = sqlx::query("DELETE FROM carts WHERE id = $1")
      .bind(cart_id)
      .execute(&mut *tx)
      .await?;
    if deleted.rows_affected() != 1 {
      warn!(cart_id = %cart_id, "Cart disappeared while locked; rolling back conversion.");
      return Err(StoreError::not_found("Cart", cart_id));
    }

    tx.commit().await?;
    info!(order_id = order.id, customer_id, cart_id = %cart_id, lines = lines.len(), "Cart converted to order.");
    self.get_order(order.id).await
  }

  async fn set_payment_status(&self, id: i64, status: PaymentStatus) -> StoreResult<OrderDetail> {
    let done = sqlx::query("UPDATE orders SET payment_status = $2 WHERE id = $1")
      .bind(id)
      .bind(status)
      .execute(&self.pool)
      .await?;
    if done.rows_affected() == 0 {
      return Err(StoreError::not_found("Order", id));
    }
    self.get_order(id).await
  }

  async fn delete_order(&self, id: i64) -> StoreResult<()> {
    let done = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    if done.rows_affected() == 0 {
      return Err(StoreError::not_found("Order", id));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("mug"), "%mug%");
    assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
  }

  #[test]
  fn filters_render_in_order() {
    let query = ProductQuery {
      collection_id: Some(3),
      unit_price_lt: Some(900),
      search: Some("tea".to_string()),
      ..Default::default()
    };
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
    push_product_filters(&mut qb, &query);
    assert_eq!(
      qb.sql(),
      "SELECT COUNT(*) FROM products WHERE TRUE AND collection_id = $1 AND unit_price_cents < $2 \
       AND (title ILIKE $3 OR description ILIKE $4)"
    );
  }
}
