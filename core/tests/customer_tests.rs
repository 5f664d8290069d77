// tests/customer_tests.rs
mod common;

use chrono::NaiveDate;
use common::*;
use serial_test::serial;
use storefront::models::{CustomerInput, CustomerPatch, CustomerProfile, Membership, PlaceOrder};
use storefront::services::{customers, orders};
use storefront::ErrorKind;

#[tokio::test]
#[serial]
async fn me_creates_the_record_on_first_access() {
  setup_tracing();
  let shop = shop().await;
  let first = customers::me(&shop.ds, Some(&shop.alice)).await.unwrap();
  assert_eq!(first.user_id, shop.alice.id);
  assert_eq!(first.membership, Membership::Bronze);
  assert_eq!(first.phone, "");

  let second = customers::me(&shop.ds, Some(&shop.alice)).await.unwrap();
  assert_eq!(first.id, second.id);

  let err = customers::me(&shop.ds, None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[tokio::test]
#[serial]
async fn me_can_be_updated_before_it_exists() {
  setup_tracing();
  let shop = shop().await;
  let profile = CustomerProfile {
    phone: "555-0100".to_string(),
    birth_date: NaiveDate::from_ymd_opt(1990, 4, 1),
    membership: Membership::Gold,
  };
  let updated = customers::update_me(&shop.ds, Some(&shop.bob), &profile).await.unwrap();
  assert_eq!(updated.user_id, shop.bob.id);
  assert_eq!(updated.phone, "555-0100");
  assert_eq!(updated.membership, Membership::Gold);

  let err = customers::update_me(&shop.ds, None, &profile).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[tokio::test]
#[serial]
async fn customer_administration_is_staff_only() {
  setup_tracing();
  let shop = shop().await;
  let err = customers::list_customers(&shop.ds, Some(&shop.alice)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::PermissionDenied);

  let created = customers::create_customer(
    &shop.ds,
    Some(&shop.staff),
    &CustomerInput {
      user_id: shop.bob.id,
      profile: CustomerProfile::default(),
    },
  )
  .await
  .unwrap();

  let duplicate = customers::create_customer(
    &shop.ds,
    Some(&shop.staff),
    &CustomerInput {
      user_id: shop.bob.id,
      profile: CustomerProfile::default(),
    },
  )
  .await
  .unwrap_err();
  assert!(duplicate.field_errors().unwrap().contains("user_id"));

  let ghost = customers::create_customer(
    &shop.ds,
    Some(&shop.staff),
    &CustomerInput {
      user_id: 9_999,
      profile: CustomerProfile::default(),
    },
  )
  .await
  .unwrap_err();
  assert!(ghost.field_errors().unwrap().contains("user_id"));

  let patched = customers::patch_customer(
    &shop.ds,
    Some(&shop.staff),
    created.id,
    CustomerPatch {
      membership: Some(Membership::Silver),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(patched.membership, Membership::Silver);

  let listed = customers::list_customers(&shop.ds, Some(&shop.staff)).await.unwrap();
  assert_eq!(listed.len(), 1);

  customers::delete_customer(&shop.ds, Some(&shop.staff), created.id)
    .await
    .unwrap();
  let err = customers::get_customer(&shop.ds, Some(&shop.staff), created.id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[serial]
async fn customers_with_orders_cannot_be_deleted() {
  setup_tracing();
  let shop = shop().await;
  let cart_id = cart_with(&shop.ds, &[(shop.mug.id, 1)]).await;
  let order = orders::place_order(&shop.ds, Some(&shop.alice), &PlaceOrder { cart_id })
    .await
    .unwrap();

  let err = customers::delete_customer(&shop.ds, Some(&shop.superuser), order.customer_id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotAllowed);
}
