// apps/storefront_api/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod cart_handlers;
pub mod collection_handlers;
pub mod customer_handlers;
pub mod order_handlers;
pub mod playground_handlers;
pub mod product_handlers;
pub mod review_handlers;
