// apps/storefront_api/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{
  auth_handlers, cart_handlers, collection_handlers, customer_handlers, order_handlers, playground_handlers,
  product_handlers, review_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.route("/health", web::get().to(health_check_handler)).service(
    web::scope("/api/v1")
      // Accounts and tokens
      .service(
        web::scope("/auth")
          .service(web::resource("/users").route(web::post().to(auth_handlers::register_handler)))
          .service(web::resource("/users/me").route(web::get().to(auth_handlers::current_user_handler)))
          .service(web::resource("/jwt/create").route(web::post().to(auth_handlers::create_token_handler))),
      )
      // Catalog
      .service(
        web::scope("/collections")
          .service(
            web::resource("")
              .route(web::get().to(collection_handlers::list_collections_handler))
              .route(web::post().to(collection_handlers::create_collection_handler)),
          )
          .service(
            web::resource("/{collection_id}")
              .route(web::get().to(collection_handlers::get_collection_handler))
              .route(web::put().to(collection_handlers::update_collection_handler))
              .route(web::patch().to(collection_handlers::patch_collection_handler))
              .route(web::delete().to(collection_handlers::delete_collection_handler)),
          ),
      )
      .service(
        web::scope("/products")
          .service(
            web::resource("")
              .route(web::get().to(product_handlers::list_products_handler))
              .route(web::post().to(product_handlers::create_product_handler)),
          )
          .service(
            web::resource("/{product_id}/reviews")
              .route(web::get().to(review_handlers::list_reviews_handler))
              .route(web::post().to(review_handlers::create_review_handler)),
          )
          .service(
            web::resource("/{product_id}/reviews/{review_id}")
              .route(web::get().to(review_handlers::get_review_handler))
              .route(web::put().to(review_handlers::update_review_handler))
              .route(web::patch().to(review_handlers::patch_review_handler))
              .route(web::delete().to(review_handlers::delete_review_handler)),
          )
          .service(
            web::resource("/{product_id}")
              .route(web::get().to(product_handlers::get_product_handler))
              .route(web::put().to(product_handlers::update_product_handler))
              .route(web::patch().to(product_handlers::patch_product_handler))
              .route(web::delete().to(product_handlers::delete_product_handler)),
          ),
      )
      // Carts, open to anonymous callers
      .service(
        web::scope("/carts")
          .service(web::resource("").route(web::post().to(cart_handlers::create_cart_handler)))
          .service(
            web::resource("/{cart_id}/items")
              .route(web::get().to(cart_handlers::list_items_handler))
              .route(web::post().to(cart_handlers::add_item_handler)),
          )
          .service(
            web::resource("/{cart_id}/items/{item_id}")
              .route(web::get().to(cart_handlers::get_item_handler))
              .route(web::patch().to(cart_handlers::update_item_handler))
              .route(web::delete().to(cart_handlers::remove_item_handler)),
          )
          .service(
            web::resource("/{cart_id}")
              .route(web::get().to(cart_handlers::get_cart_handler))
              .route(web::delete().to(cart_handlers::delete_cart_handler)),
          ),
      )
      .service(
        web::scope("/customers")
          // Before `/{customer_id}` so `me` is never parsed as an id.
          .service(
            web::resource("/me")
              .route(web::get().to(customer_handlers::get_me_handler))
              .route(web::put().to(customer_handlers::update_me_handler)),
          )
          .service(
            web::resource("")
              .route(web::get().to(customer_handlers::list_customers_handler))
              .route(web::post().to(customer_handlers::create_customer_handler)),
          )
          .service(
            web::resource("/{customer_id}")
              .route(web::get().to(customer_handlers::get_customer_handler))
              .route(web::put().to(customer_handlers::update_customer_handler))
              .route(web::patch().to(customer_handlers::patch_customer_handler))
              .route(web::delete().to(customer_handlers::delete_customer_handler)),
          ),
      )
      .service(
        web::scope("/orders")
          .service(
            web::resource("")
              .route(web::get().to(order_handlers::list_orders_handler))
              .route(web::post().to(order_handlers::place_order_handler)),
          )
          .service(
            web::resource("/{order_id}")
              .route(web::get().to(order_handlers::get_order_handler))
              .route(web::patch().to(order_handlers::update_order_handler))
              .route(web::delete().to(order_handlers::delete_order_handler)),
          ),
      )
      .service(
        web::scope("/playground")
          .service(web::resource("/hello").route(web::get().to(playground_handlers::say_hello_handler))),
      ),
  );
}
