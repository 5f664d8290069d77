// core/src/datastore/memory.rs

//! A `Datastore` kept entirely in process memory.
//!
//! All tables sit behind one `parking_lot::RwLock`, so every operation, the
//! cart-to-order conversion included, observes and mutates a consistent snapshot.
//! Lock guards are never held across an `.await`: no method body awaits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Datastore, EMPTY_CART};
use crate::error::{StoreError, StoreResult};
use crate::models::{
  Cart, CartDetail, CartLine, Collection, CollectionInput, Customer, CustomerInput, CustomerProfile, NewUser, Order,
  OrderDetail, OrderItem, PaymentStatus, Product, ProductInput, Review, ReviewInput, SimpleProduct, User,
};
use crate::models::cart::QUANTITY_OVERFLOW;
use crate::query::{Page, ProductQuery};

#[derive(Debug, Clone)]
struct CartItemRow {
  id: i64,
  cart_id: Uuid,
  product_id: i64,
  quantity: i32,
}

#[derive(Debug, Clone)]
struct OrderItemRow {
  id: i64,
  order_id: i64,
  product_id: i64,
  quantity: i32,
  unit_price_cents: i64,
}

#[derive(Debug, Clone)]
struct TokenRow {
  user_id: i64,
  expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
  sequences: HashMap<&'static str, i64>,
  collections: BTreeMap<i64, String>,
  products: BTreeMap<i64, Product>,
  reviews: BTreeMap<i64, Review>,
  carts: HashMap<Uuid, Cart>,
  cart_items: BTreeMap<i64, CartItemRow>,
  users: BTreeMap<i64, User>,
  tokens: HashMap<String, TokenRow>,
  customers: BTreeMap<i64, Customer>,
  orders: BTreeMap<i64, Order>,
  order_items: BTreeMap<i64, OrderItemRow>,
}

impl Tables {
  fn next_id(&mut self, table: &'static str) -> i64 {
    let id = self.sequences.entry(table).or_insert(0);
    *id += 1;
    *id
  }

  fn collection(&self, id: i64) -> StoreResult<Collection> {
    let title = self
      .collections
      .get(&id)
      .ok_or_else(|| StoreError::not_found("Collection", id))?;
    let products_count = self.products.values().filter(|p| p.collection_id == id).count() as i64;
    Ok(Collection {
      id,
      title: title.clone(),
      products_count,
    })
  }

  fn product(&self, id: i64) -> StoreResult<&Product> {
    self.products.get(&id).ok_or_else(|| StoreError::not_found("Product", id))
  }

  fn simple_product(&self, id: i64) -> StoreResult<SimpleProduct> {
    let product = self.product(id)?;
    Ok(SimpleProduct {
      id: product.id,
      title: product.title.clone(),
      unit_price_cents: product.unit_price_cents,
    })
  }

  fn review(&self, product_id: i64, id: i64) -> StoreResult<&Review> {
    self
      .reviews
      .get(&id)
      .filter(|r| r.product_id == product_id)
      .ok_or_else(|| StoreError::not_found("Review", id))
  }

  fn cart(&self, id: Uuid) -> StoreResult<&Cart> {
    self.carts.get(&id).ok_or_else(|| StoreError::not_found("Cart", id))
  }

  fn cart_line(&self, row: &CartItemRow) -> StoreResult<CartLine> {
    Ok(CartLine::new(row.id, self.simple_product(row.product_id)?, row.quantity))
  }

  fn cart_detail(&self, id: Uuid) -> StoreResult<CartDetail> {
    let cart = self.cart(id)?.clone();
    let lines = self
      .cart_items
      .values()
      .filter(|row| row.cart_id == id)
      .map(|row| self.cart_line(row))
      .collect::<StoreResult<Vec<_>>>()?;
    Ok(CartDetail::assemble(cart, lines))
  }

  fn cart_item(&self, cart_id: Uuid, item_id: i64) -> StoreResult<&CartItemRow> {
    self.cart(cart_id)?;
    self
      .cart_items
      .get(&item_id)
      .filter(|row| row.cart_id == cart_id)
      .ok_or_else(|| StoreError::not_found("Cart item", item_id))
  }

  fn customer(&self, id: i64) -> StoreResult<&Customer> {
    self.customers.get(&id).ok_or_else(|| StoreError::not_found("Customer", id))
  }

  fn customer_by_user(&self, user_id: i64) -> Option<&Customer> {
    self.customers.values().find(|c| c.user_id == user_id)
  }

  fn insert_customer(&mut self, user_id: i64, profile: &CustomerProfile) -> Customer {
    let id = self.next_id("customers");
    let customer = Customer {
      id,
      user_id,
      phone: profile.phone.clone(),
      birth_date: profile.birth_date,
      membership: profile.membership,
    };
    self.customers.insert(id, customer.clone());
    customer
  }

  fn order_detail(&self, id: i64) -> StoreResult<OrderDetail> {
    let order = self
      .orders
      .get(&id)
      .ok_or_else(|| StoreError::not_found("Order", id))?
      .clone();
    let items = self
      .order_items
      .values()
      .filter(|row| row.order_id == id)
      .map(|row| {
        Ok(OrderItem {
          id: row.id,
          product: self.simple_product(row.product_id)?,
          quantity: row.quantity,
          unit_price_cents: row.unit_price_cents,
        })
      })
      .collect::<StoreResult<Vec<_>>>()?;
    Ok(OrderDetail::assemble(order, items))
  }
}

#[derive(Debug, Default)]
pub struct MemoryDatastore {
  tables: RwLock<Tables>,
}

impl MemoryDatastore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Datastore for MemoryDatastore {
  async fn list_collections(&self) -> StoreResult<Vec<Collection>> {
    let tables = self.tables.read();
    tables.collections.keys().map(|id| tables.collection(*id)).collect()
  }

  async fn get_collection(&self, id: i64) -> StoreResult<Collection> {
    self.tables.read().collection(id)
  }

  async fn create_collection(&self, input: &CollectionInput) -> StoreResult<Collection> {
    let mut tables = self.tables.write();
    let id = tables.next_id("collections");
    tables.collections.insert(id, input.title.clone());
    tables.collection(id)
  }

  async fn update_collection(&self, id: i64, input: &CollectionInput) -> StoreResult<Collection> {
    let mut tables = self.tables.write();
    let title = tables
      .collections
      .get_mut(&id)
      .ok_or_else(|| StoreError::not_found("Collection", id))?;
    *title = input.title.clone();
    tables.collection(id)
  }

  async fn delete_collection(&self, id: i64) -> StoreResult<()> {
    let mut tables = self.tables.write();
    let collection = tables.collection(id)?;
    if collection.products_count > 0 {
      return Err(StoreError::NotAllowed(
        "Collection cannot be deleted because it includes one or more products.".to_string(),
      ));
    }
    tables.collections.remove(&id);
    Ok(())
  }

  async fn list_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>> {
    let tables = self.tables.read();
    let mut matching: Vec<&Product> = tables.products.values().filter(|p| query.matches(p)).collect();
    matching.sort_by(|a, b| query.ordering.compare(a, b));
    let results = matching
      .iter()
      .skip(query.page.offset as usize)
      .take(query.page.limit as usize)
      .map(|p| (*p).clone())
      .collect();
    Ok(Page {
      count: matching.len() as u64,
      limit: query.page.limit,
      offset: query.page.offset,
      results,
    })
  }

  async fn get_product(&self, id: i64) -> StoreResult<Product> {
    self.tables.read().product(id).cloned()
  }

  async fn create_product(&self, input: &ProductInput) -> StoreResult<Product> {
    let mut tables = self.tables.write();
    tables.collection(input.collection_id)?;
    let id = tables.next_id("products");
    let product = Product {
      id,
      title: input.title.clone(),
      slug: input.slug.clone(),
      description: input.description.clone(),
      unit_price_cents: input.unit_price_cents,
      inventory: input.inventory,
      collection_id: input.collection_id,
      last_update: Utc::now(),
    };
    tables.products.insert(id, product.clone());
    Ok(product)
  }

  async fn update_product(&self, id: i64, input: &ProductInput) -> StoreResult<Product> {
    let mut tables = self.tables.write();
    tables.collection(input.collection_id)?;
    let product = tables
      .products
      .get_mut(&id)
      .ok_or_else(|| StoreError::not_found("Product", id))?;
    product.title = input.title.clone();
    product.slug = input.slug.clone();
    product.description = input.description.clone();
    product.unit_price_cents = input.unit_price_cents;
    product.inventory = input.inventory;
    product.collection_id = input.collection_id;
    product.last_update = Utc::now();
    Ok(product.clone())
  }

  async fn delete_product(&self, id: i64) -> StoreResult<()> {
    let mut tables = self.tables.write();
    tables.product(id)?;
    if tables.order_items.values().any(|row| row.product_id == id) {
      return Err(StoreError::NotAllowed(
        "Product cannot be deleted because it is associated with an order item.".to_string(),
      ));
    }
    tables.products.remove(&id);
    tables.reviews.retain(|_, r| r.product_id != id);
    tables.cart_items.retain(|_, row| row.product_id != id);
    Ok(())
  }

  async fn list_reviews(&self, product_id: i64) -> StoreResult<Vec<Review>> {
    let tables = self.tables.read();
    tables.product(product_id)?;
    Ok(
      tables
        .reviews
        .values()
        .filter(|r| r.product_id == product_id)
        .cloned()
        .collect(),
    )
  }

  async fn get_review(&self, product_id: i64, id: i64) -> StoreResult<Review> {
    self.tables.read().review(product_id, id).cloned()
  }

  async fn create_review(&self, product_id: i64, input: &ReviewInput) -> StoreResult<Review> {
    let mut tables = self.tables.write();
    tables.product(product_id)?;
    let id = tables.next_id("reviews");
    let review = Review {
      id,
      product_id,
      name: input.name.clone(),
      description: input.description.clone(),
      date: Utc::now().date_naive(),
    };
    tables.reviews.insert(id, review.clone());
    Ok(review)
  }

  async fn update_review(&self, product_id: i64, id: i64, input: &ReviewInput) -> StoreResult<Review> {
    let mut tables = self.tables.write();
    tables.review(product_id, id)?;
    let review = tables
      .reviews
      .get_mut(&id)
      .ok_or_else(|| StoreError::not_found("Review", id))?;
    review.name = input.name.clone();
    review.description = input.description.clone();
    Ok(review.clone())
  }

  async fn delete_review(&self, product_id: i64, id: i64) -> StoreResult<()> {
    let mut tables = self.tables.write();
    tables.review(product_id, id)?;
    tables.reviews.remove(&id);
    Ok(())
  }

  async fn create_cart(&self) -> StoreResult<CartDetail> {
    let mut tables = self.tables.write();
    let cart = Cart {
      id: Uuid::new_v4(),
      created_at: Utc::now(),
    };
    tables.carts.insert(cart.id, cart.clone());
    Ok(CartDetail::assemble(cart, Vec::new()))
  }

  async fn get_cart(&self, id: Uuid) -> StoreResult<CartDetail> {
    self.tables.read().cart_detail(id)
  }

  async fn delete_cart(&self, id: Uuid) -> StoreResult<()> {
    let mut tables = self.tables.write();
    tables
      .carts
      .remove(&id)
      .ok_or_else(|| StoreError::not_found("Cart", id))?;
    tables.cart_items.retain(|_, row| row.cart_id != id);
    Ok(())
  }

  async fn add_cart_item(&self, cart_id: Uuid, product_id: i64, quantity: i32) -> StoreResult<CartLine> {
    let mut tables = self.tables.write();
    tables.cart(cart_id)?;
    tables.product(product_id)?;

    let existing = tables
      .cart_items
      .values()
      .find(|row| row.cart_id == cart_id && row.product_id == product_id)
      .map(|row| row.id);
    let row = match existing {
      Some(item_id) => {
        let row = tables
          .cart_items
          .get_mut(&item_id)
          .ok_or_else(|| StoreError::Internal(format!("cart item {} vanished under lock", item_id)))?;
        row.quantity = row
          .quantity
          .checked_add(quantity)
          .ok_or_else(|| StoreError::invalid("quantity", QUANTITY_OVERFLOW))?;
        debug!(cart_id = %cart_id, item_id, quantity = row.quantity, "Incremented existing cart line.");
        row.clone()
      }
      None => {
        let id = tables.next_id("cart_items");
        let row = CartItemRow {
          id,
          cart_id,
          product_id,
          quantity,
        };
        tables.cart_items.insert(id, row.clone());
        row
      }
    };
    tables.cart_line(&row)
  }

  async fn get_cart_item(&self, cart_id: Uuid, item_id: i64) -> StoreResult<CartLine> {
    let tables = self.tables.read();
    let row = tables.cart_item(cart_id, item_id)?;
    tables.cart_line(row)
  }

  async fn set_cart_item_quantity(&self, cart_id: Uuid, item_id: i64, quantity: i32) -> StoreResult<CartLine> {
    let mut tables = self.tables.write();
    tables.cart_item(cart_id, item_id)?;
    let row = tables
      .cart_items
      .get_mut(&item_id)
      .ok_or_else(|| StoreError::not_found("Cart item", item_id))?;
    row.quantity = quantity;
    let row = row.clone();
    tables.cart_line(&row)
  }

  async fn remove_cart_item(&self, cart_id: Uuid, item_id: i64) -> StoreResult<()> {
    let mut tables = self.tables.write();
    tables.cart_item(cart_id, item_id)?;
    tables.cart_items.remove(&item_id);
    Ok(())
  }

  async fn create_user(&self, new: &NewUser) -> StoreResult<User> {
    let mut tables = self.tables.write();
    if tables.users.values().any(|u| u.username == new.username) {
      return Err(StoreError::invalid(
        "username",
        "A user with that username already exists.",
      ));
    }
    let id = tables.next_id("users");
    let user = User {
      id,
      username: new.username.clone(),
      email: new.email.clone(),
      first_name: new.first_name.clone(),
      last_name: new.last_name.clone(),
      password_hash: new.password_hash.clone(),
      is_staff: new.is_staff,
      is_superuser: new.is_superuser,
      permissions: new.permissions.clone(),
    };
    tables.users.insert(id, user.clone());
    Ok(user)
  }

  async fn get_user(&self, id: i64) -> StoreResult<User> {
    self
      .tables
      .read()
      .users
      .get(&id)
      .cloned()
      .ok_or_else(|| StoreError::not_found("User", id))
  }

  async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
    Ok(self.tables.read().users.values().find(|u| u.username == username).cloned())
  }

  async fn store_token(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) -> StoreResult<()> {
    let mut tables = self.tables.write();
    if !tables.users.contains_key(&user_id) {
      return Err(StoreError::not_found("User", user_id));
    }
    tables
      .tokens
      .insert(token.to_string(), TokenRow { user_id, expires_at });
    Ok(())
  }

  async fn find_user_by_token(&self, token: &str, now: DateTime<Utc>) -> StoreResult<Option<User>> {
    let tables = self.tables.read();
    Ok(
      tables
        .tokens
        .get(token)
        .filter(|row| row.expires_at > now)
        .and_then(|row| tables.users.get(&row.user_id))
        .cloned(),
    )
  }

  async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
    Ok(self.tables.read().customers.values().cloned().collect())
  }

  async fn get_customer(&self, id: i64) -> StoreResult<Customer> {
    self.tables.read().customer(id).cloned()
  }

  async fn find_customer_by_user(&self, user_id: i64) -> StoreResult<Option<Customer>> {
    Ok(self.tables.read().customer_by_user(user_id).cloned())
  }

  async fn ensure_customer(&self, user_id: i64) -> StoreResult<Customer> {
    let mut tables = self.tables.write();
    if let Some(customer) = tables.customer_by_user(user_id) {
      return Ok(customer.clone());
    }
    if !tables.users.contains_key(&user_id) {
      return Err(StoreError::not_found("User", user_id));
    }
    let customer = tables.insert_customer(user_id, &CustomerProfile::default());
    info!(customer_id = customer.id, user_id, "Created customer record.");
    Ok(customer)
  }

  async fn create_customer(&self, input: &CustomerInput) -> StoreResult<Customer> {
    let mut tables = self.tables.write();
    if !tables.users.contains_key(&input.user_id) {
      return Err(StoreError::invalid(
        "user_id",
        format!("Invalid pk \"{}\" - object does not exist.", input.user_id),
      ));
    }
    if tables.customer_by_user(input.user_id).is_some() {
      return Err(StoreError::invalid("user_id", "customer with this user already exists."));
    }
    Ok(tables.insert_customer(input.user_id, &input.profile))
  }

  async fn update_customer(&self, id: i64, profile: &CustomerProfile) -> StoreResult<Customer> {
    let mut tables = self.tables.write();
    let customer = tables
      .customers
      .get_mut(&id)
      .ok_or_else(|| StoreError::not_found("Customer", id))?;
    customer.phone = profile.phone.clone();
    customer.birth_date = profile.birth_date;
    customer.membership = profile.membership;
    Ok(customer.clone())
  }

  async fn delete_customer(&self, id: i64) -> StoreResult<()> {
    let mut tables = self.tables.write();
    tables.customer(id)?;
    if tables.orders.values().any(|o| o.customer_id == id) {
      return Err(StoreError::NotAllowed(
        "Customer cannot be deleted because they have placed orders.".to_string(),
      ));
    }
    tables.customers.remove(&id);
    Ok(())
  }

  async fn list_orders(&self, customer_id: Option<i64>) -> StoreResult<Vec<OrderDetail>> {
    let tables = self.tables.read();
    tables
      .orders
      .values()
      .rev()
      .filter(|o| customer_id.map_or(true, |c| o.customer_id == c))
      .map(|o| tables.order_detail(o.id))
      .collect()
  }

  async fn get_order(&self, id: i64) -> StoreResult<OrderDetail> {
    self.tables.read().order_detail(id)
  }

  async fn place_order(&self, cart_id: Uuid, customer_id: i64) -> StoreResult<OrderDetail> {
    // One write guard for the whole conversion: a second converter of the same
    // cart waits here and then finds the cart gone.
    let mut tables = self.tables.write();
    tables.cart(cart_id)?;
    tables.customer(customer_id)?;

    let lines: Vec<CartItemRow> = tables
      .cart_items
      .values()
      .filter(|row| row.cart_id == cart_id)
      .cloned()
      .collect();
    if lines.is_empty() {
      return Err(StoreError::invalid("cart_id", EMPTY_CART));
    }

    // Resolve every price before touching any table so a failure leaves no trace.
    let mut priced = Vec::with_capacity(lines.len());
    for line in &lines {
      let unit_price_cents = tables.product(line.product_id)?.unit_price_cents;
      priced.push((line.product_id, line.quantity, unit_price_cents));
    }

    let order_id = tables.next_id("orders");
    tables.orders.insert(
      order_id,
      Order {
        id: order_id,
        customer_id,
        placed_at: Utc::now(),
        payment_status: PaymentStatus::Pending,
      },
    );
    for (product_id, quantity, unit_price_cents) in priced {
      let id = tables.next_id("order_items");
      tables.order_items.insert(
        id,
        OrderItemRow {
          id,
          order_id,
          product_id,
          quantity,
          unit_price_cents,
        },
      );
    }
    tables.carts.remove(&cart_id);
    tables.cart_items.retain(|_, row| row.cart_id != cart_id);

    info!(order_id, customer_id, cart_id = %cart_id, lines = lines.len(), "Cart converted to order.");
    tables.order_detail(order_id)
  }

  async fn set_payment_status(&self, id: i64, status: PaymentStatus) -> StoreResult<OrderDetail> {
    let mut tables = self.tables.write();
    let order = tables
      .orders
      .get_mut(&id)
      .ok_or_else(|| StoreError::not_found("Order", id))?;
    order.payment_status = status;
    tables.order_detail(id)
  }

  async fn delete_order(&self, id: i64) -> StoreResult<()> {
    let mut tables = self.tables.write();
    tables
      .orders
      .remove(&id)
      .ok_or_else(|| StoreError::not_found("Order", id))?;
    tables.order_items.retain(|_, row| row.order_id != id);
    Ok(())
  }
}
