// tests/catalog_tests.rs
mod common;

use common::*;
use serial_test::serial;
use storefront::models::{CollectionInput, ReviewInput, ReviewPatch};
use storefront::services::catalog;
use storefront::{ErrorKind, OrderField, Pagination, ProductOrdering, ProductQuery};

fn kitchenware() -> CollectionInput {
  CollectionInput {
    title: "Kitchenware".to_string(),
  }
}

#[tokio::test]
#[serial]
async fn collection_creation_follows_the_permission_matrix() {
  setup_tracing();
  let shop = shop().await;

  let anonymous = catalog::create_collection(&shop.ds, None, &kitchenware()).await.unwrap_err();
  assert_eq!(anonymous.kind(), ErrorKind::Unauthenticated);

  let customer = catalog::create_collection(&shop.ds, Some(&shop.alice), &kitchenware())
    .await
    .unwrap_err();
  assert_eq!(customer.kind(), ErrorKind::PermissionDenied);

  let bare = catalog::create_collection(&shop.ds, Some(&shop.bare_staff), &kitchenware())
    .await
    .unwrap_err();
  assert_eq!(bare.kind(), ErrorKind::PermissionDenied);

  let by_staff = catalog::create_collection(&shop.ds, Some(&shop.staff), &kitchenware())
    .await
    .unwrap();
  assert_eq!(by_staff.title, "Kitchenware");
  assert_eq!(by_staff.products_count, 0);

  let by_root = catalog::create_collection(&shop.ds, Some(&shop.superuser), &kitchenware())
    .await
    .unwrap();
  assert_ne!(by_root.id, by_staff.id);
}

#[tokio::test]
#[serial]
async fn blank_collection_title_is_a_field_error() {
  setup_tracing();
  let shop = shop().await;
  let err = catalog::create_collection(
    &shop.ds,
    Some(&shop.superuser),
    &CollectionInput {
      title: "  ".to_string(),
    },
  )
  .await
  .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(err.field_errors().unwrap().contains("title"));
}

#[tokio::test]
#[serial]
async fn collections_with_products_cannot_be_deleted() {
  setup_tracing();
  let shop = shop().await;
  let listed = catalog::list_collections(&shop.ds).await.unwrap();
  assert_eq!(listed[0].products_count, 2);

  let err = catalog::delete_collection(&shop.ds, Some(&shop.staff), shop.collection.id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotAllowed);

  let empty = catalog::create_collection(&shop.ds, Some(&shop.staff), &kitchenware())
    .await
    .unwrap();
  catalog::delete_collection(&shop.ds, Some(&shop.staff), empty.id)
    .await
    .unwrap();
  assert_eq!(
    catalog::get_collection(&shop.ds, empty.id).await.unwrap_err().kind(),
    ErrorKind::NotFound
  );
}

#[tokio::test]
#[serial]
async fn products_need_an_existing_collection() {
  setup_tracing();
  let shop = shop().await;
  let err = catalog::create_product(&shop.ds, Some(&shop.staff), &product_input("Spoon", 404, 300))
    .await
    .unwrap_err();
  let fields = err.field_errors().expect("validation error");
  assert!(fields.contains("collection_id"));

  let cheap = catalog::create_product(
    &shop.ds,
    Some(&shop.staff),
    &product_input("Spoon", shop.collection.id, 99),
  )
  .await
  .unwrap_err();
  assert!(cheap.field_errors().unwrap().contains("unit_price_cents"));

  let spoon = catalog::create_product(
    &shop.ds,
    Some(&shop.staff),
    &product_input("Spoon", shop.collection.id, 300),
  )
  .await
  .unwrap();
  assert_eq!(spoon.price_with_tax_cents, 330);
}

#[tokio::test]
#[serial]
async fn product_listing_filters_searches_orders_and_pages() {
  setup_tracing();
  let shop = shop().await;
  for (title, price) in [("Teapot", 3_000), ("Tea Towel", 800), ("Bowl", 1_500)] {
    catalog::create_product(
      &shop.ds,
      Some(&shop.staff),
      &product_input(title, shop.collection.id, price),
    )
    .await
    .unwrap();
  }

  let all = catalog::list_products(&shop.ds, &ProductQuery::default()).await.unwrap();
  assert_eq!(all.count, 5);
  let prices: Vec<i64> = all.results.iter().map(|p| p.product.unit_price_cents).collect();
  assert_eq!(prices, vec![499, 800, 1_250, 1_500, 3_000]);

  let tea = catalog::list_products(
    &shop.ds,
    &ProductQuery {
      search: Some("TEA".to_string()),
      ordering: ProductOrdering {
        field: OrderField::UnitPrice,
        descending: true,
      },
      ..Default::default()
    },
  )
  .await
  .unwrap();
  let titles: Vec<&str> = tea.results.iter().map(|p| p.product.title.as_str()).collect();
  assert_eq!(titles, vec!["Teapot", "Tea Towel", "Green Tea"]);

  let window = catalog::list_products(
    &shop.ds,
    &ProductQuery {
      unit_price_gt: Some(499),
      unit_price_lt: Some(3_000),
      page: Pagination { limit: 2, offset: 1 },
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(window.count, 3);
  assert_eq!(window.limit, 2);
  let prices: Vec<i64> = window.results.iter().map(|p| p.product.unit_price_cents).collect();
  assert_eq!(prices, vec![1_250, 1_500]);
}

#[tokio::test]
#[serial]
async fn anyone_reviews_but_only_staff_edit_reviews() {
  setup_tracing();
  let shop = shop().await;
  let review = catalog::create_review(
    &shop.ds,
    shop.mug.id,
    &ReviewInput {
      name: "Sam".to_string(),
      description: "Holds tea.".to_string(),
    },
  )
  .await
  .unwrap();
  assert_eq!(review.product_id, shop.mug.id);

  let patch = ReviewPatch {
    description: Some("Holds coffee too.".to_string()),
    ..Default::default()
  };
  let err = catalog::patch_review(&shop.ds, Some(&shop.alice), shop.mug.id, review.id, patch.clone())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::PermissionDenied);

  let edited = catalog::patch_review(&shop.ds, Some(&shop.staff), shop.mug.id, review.id, patch)
    .await
    .unwrap();
  assert_eq!(edited.name, "Sam");
  assert_eq!(edited.description, "Holds coffee too.");

  // Reviews are only reachable through their own product.
  let err = catalog::get_review(&shop.ds, shop.tea.id, review.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  catalog::delete_review(&shop.ds, Some(&shop.staff), shop.mug.id, review.id)
    .await
    .unwrap();
  assert!(catalog::list_reviews(&shop.ds, shop.mug.id).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn reviews_of_unknown_products_are_not_found() {
  setup_tracing();
  let shop = shop().await;
  let err = catalog::create_review(
    &shop.ds,
    9_999,
    &ReviewInput {
      name: "Sam".to_string(),
      description: "?".to_string(),
    },
  )
  .await
  .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}
