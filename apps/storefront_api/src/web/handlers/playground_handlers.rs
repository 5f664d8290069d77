// apps/storefront_api/src/web/handlers/playground_handlers.rs
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::services::notifications::Notification;
use crate::state::AppState;

/// Queues a broadcast to every customer and answers at once.
#[instrument(name = "handler::say_hello", skip(app_state))]
pub async fn say_hello_handler(app_state: web::Data<AppState>) -> HttpResponse {
  let queued = app_state.notifier.dispatch(Notification::NotifyCustomers {
    message: "hello".to_string(),
  });
  HttpResponse::Ok().json(json!({ "message": "hello", "queued": queued }))
}
