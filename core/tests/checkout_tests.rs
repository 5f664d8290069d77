// tests/checkout_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use storefront::models::{PlaceOrder, ProductPatch};
use storefront::services::{carts, catalog, customers, orders};
use storefront::{Datastore, ErrorKind};
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn converting_a_cart_snapshots_its_lines() {
  setup_tracing();
  let shop = shop().await;
  let cart_id = cart_with(&shop.ds, &[(shop.mug.id, 2), (shop.tea.id, 1)]).await;

  let order = orders::place_order(&shop.ds, Some(&shop.alice), &PlaceOrder { cart_id })
    .await
    .unwrap();

  let alice = customers::me(&shop.ds, Some(&shop.alice)).await.unwrap();
  assert_eq!(order.customer_id, alice.id);
  assert_eq!(order.payment_status.as_str(), "pending");
  assert_eq!(order.items.len(), 2);
  assert_eq!(order.items[0].product.id, shop.mug.id);
  assert_eq!(order.items[0].quantity, 2);
  assert_eq!(order.items[0].unit_price_cents, 1_250);
  assert_eq!(order.items[1].product.id, shop.tea.id);
  assert_eq!(order.items[1].quantity, 1);
  assert_eq!(order.items[1].unit_price_cents, 499);
}

#[tokio::test]
#[serial]
async fn the_cart_is_gone_after_conversion() {
  setup_tracing();
  let shop = shop().await;
  let cart_id = cart_with(&shop.ds, &[(shop.mug.id, 1)]).await;
  orders::place_order(&shop.ds, Some(&shop.alice), &PlaceOrder { cart_id })
    .await
    .unwrap();

  let err = carts::get_cart(&shop.ds, cart_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let again = orders::place_order(&shop.ds, Some(&shop.alice), &PlaceOrder { cart_id })
    .await
    .unwrap_err();
  assert_eq!(again.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[serial]
async fn later_price_changes_do_not_touch_placed_orders() {
  setup_tracing();
  let shop = shop().await;
  let cart_id = cart_with(&shop.ds, &[(shop.mug.id, 1)]).await;
  let order = orders::place_order(&shop.ds, Some(&shop.alice), &PlaceOrder { cart_id })
    .await
    .unwrap();

  catalog::patch_product(
    &shop.ds,
    Some(&shop.staff),
    shop.mug.id,
    ProductPatch {
      unit_price_cents: Some(2_000),
      ..Default::default()
    },
  )
  .await
  .unwrap();

  let reloaded = orders::get_order(&shop.ds, Some(&shop.alice), order.id).await.unwrap();
  assert_eq!(reloaded.items[0].unit_price_cents, 1_250);
  assert_eq!(reloaded.items[0].product.unit_price_cents, 2_000);
}

#[tokio::test]
#[serial]
async fn empty_carts_are_rejected_without_creating_an_order() {
  setup_tracing();
  let shop = shop().await;
  let cart_id = cart_with(&shop.ds, &[]).await;

  let err = orders::place_order(&shop.ds, Some(&shop.alice), &PlaceOrder { cart_id })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(err.field_errors().unwrap().contains("cart_id"));

  assert!(shop.ds.list_orders(None).await.unwrap().is_empty());
  // The cart survives a failed conversion.
  assert!(carts::get_cart(&shop.ds, cart_id).await.is_ok());
  assert!(shop.ds.find_customer_by_user(shop.alice.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn missing_cart_and_anonymous_caller_fail() {
  setup_tracing();
  let shop = shop().await;
  let err = orders::place_order(
    &shop.ds,
    Some(&shop.alice),
    &PlaceOrder {
      cart_id: Uuid::new_v4(),
    },
  )
  .await
  .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(shop.ds.find_customer_by_user(shop.alice.id).await.unwrap().is_none());

  let cart_id = cart_with(&shop.ds, &[(shop.tea.id, 1)]).await;
  let err = orders::place_order(&shop.ds, None, &PlaceOrder { cart_id })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unauthenticated);
  assert_eq!(carts::list_items(&shop.ds, cart_id).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn ordered_products_cannot_be_deleted() {
  setup_tracing();
  let shop = shop().await;
  let cart_id = cart_with(&shop.ds, &[(shop.mug.id, 1)]).await;
  orders::place_order(&shop.ds, Some(&shop.alice), &PlaceOrder { cart_id })
    .await
    .unwrap();

  let err = catalog::delete_product(&shop.ds, Some(&shop.superuser), shop.mug.id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotAllowed);
  assert!(catalog::get_product(&shop.ds, shop.mug.id).await.is_ok());

  // A product that was never ordered goes away.
  catalog::delete_product(&shop.ds, Some(&shop.superuser), shop.tea.id)
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn concurrent_conversions_of_one_cart_succeed_once() {
  setup_tracing();
  let shop = shop().await;
  let cart_id = cart_with(&shop.ds, &[(shop.mug.id, 2), (shop.tea.id, 5)]).await;
  let ds = Arc::new(shop.ds);

  let mut handles = Vec::new();
  for user in [shop.alice.clone(), shop.bob.clone(), shop.alice.clone(), shop.bob.clone()] {
    let ds = Arc::clone(&ds);
    handles.push(tokio::spawn(async move {
      orders::place_order(ds.as_ref(), Some(&user), &PlaceOrder { cart_id }).await
    }));
  }

  let mut placed = 0;
  let mut not_found = 0;
  for handle in handles {
    match handle.await.expect("task panicked") {
      Ok(order) => {
        placed += 1;
        assert_eq!(order.items.len(), 2);
      }
      Err(e) if e.kind() == ErrorKind::NotFound => not_found += 1,
      Err(e) => panic!("unexpected error: {}", e),
    }
  }
  assert_eq!(placed, 1);
  assert_eq!(not_found, 3);
  assert_eq!(ds.list_orders(None).await.unwrap().len(), 1);
}
