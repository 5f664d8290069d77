// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every fixture

use once_cell::sync::Lazy;
use storefront::models::{AddCartItem, Collection, CollectionInput, NewUser, Product, ProductInput, User};
use storefront::services::carts;
use storefront::{Datastore, MemoryDatastore};
use tracing::Level;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// A datastore with one collection, two products and a spread of users.
pub struct Shop {
  pub ds: MemoryDatastore,
  pub superuser: User,
  /// Staff holding every collection and product permission.
  pub staff: User,
  /// Staff without any model permission.
  pub bare_staff: User,
  pub alice: User,
  pub bob: User,
  pub collection: Collection,
  pub mug: Product,
  pub tea: Product,
}

pub fn new_user(username: &str) -> NewUser {
  NewUser {
    username: username.to_string(),
    email: format!("{}@example.com", username),
    password_hash: "not-a-real-hash".to_string(),
    ..Default::default()
  }
}

pub fn product_input(title: &str, collection_id: i64, unit_price_cents: i64) -> ProductInput {
  ProductInput {
    title: title.to_string(),
    slug: title.to_lowercase().replace(' ', "-"),
    description: Some(format!("A very good {}", title.to_lowercase())),
    unit_price_cents,
    inventory: 10,
    collection_id,
  }
}

pub async fn shop() -> Shop {
  let ds = MemoryDatastore::new();

  let superuser = ds
    .create_user(&NewUser {
      is_staff: true,
      is_superuser: true,
      ..new_user("root")
    })
    .await
    .expect("superuser");
  let staff = ds
    .create_user(&NewUser {
      is_staff: true,
      permissions: [
        "add_collection",
        "change_collection",
        "delete_collection",
        "add_product",
        "change_product",
        "delete_product",
        "change_review",
        "delete_review",
      ]
      .iter()
      .map(|p| p.to_string())
      .collect(),
      ..new_user("clerk")
    })
    .await
    .expect("staff");
  let bare_staff = ds
    .create_user(&NewUser {
      is_staff: true,
      ..new_user("intern")
    })
    .await
    .expect("bare staff");
  let alice = ds.create_user(&new_user("alice")).await.expect("alice");
  let bob = ds.create_user(&new_user("bob")).await.expect("bob");

  let collection = ds
    .create_collection(&CollectionInput {
      title: "Kitchen".to_string(),
    })
    .await
    .expect("collection");
  let mug = ds
    .create_product(&product_input("Mug", collection.id, 1_250))
    .await
    .expect("mug");
  let tea = ds
    .create_product(&product_input("Green Tea", collection.id, 499))
    .await
    .expect("tea");

  Shop {
    ds,
    superuser,
    staff,
    bare_staff,
    alice,
    bob,
    collection,
    mug,
    tea,
  }
}

/// Creates a cart holding the given (product, quantity) lines.
pub async fn cart_with(ds: &dyn Datastore, lines: &[(i64, i32)]) -> Uuid {
  let cart = carts::create_cart(ds).await.expect("cart");
  for (product_id, quantity) in lines {
    carts::add_item(
      ds,
      cart.id,
      &AddCartItem {
        product_id: *product_id,
        quantity: *quantity,
      },
    )
    .await
    .expect("cart line");
  }
  cart.id
}
