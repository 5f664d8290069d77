// apps/storefront_api/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use storefront::permissions::require_authenticated;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::auth_service::{self, Credentials, Registration};
use crate::state::AppState;
use crate::web::extractors::Caller;

#[instrument(
    name = "handler::register",
    skip(app_state, req_payload),
    fields(username = %req_payload.username)
)]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<Registration>,
) -> Result<HttpResponse, AppError> {
  let user = auth_service::register(app_state.ds(), &req_payload).await?;
  info!(user_id = user.id, "Signup successful.");
  Ok(HttpResponse::Created().json(user))
}

#[instrument(
    name = "handler::create_token",
    skip(app_state, req_payload),
    fields(username = %req_payload.username)
)]
pub async fn create_token_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<Credentials>,
) -> Result<HttpResponse, AppError> {
  let token = auth_service::sign_in(app_state.ds(), &req_payload, app_state.config.token_ttl_minutes).await?;
  Ok(HttpResponse::Ok().json(token))
}

#[instrument(name = "handler::current_user", skip(caller), fields(user_id = ?caller.id()))]
pub async fn current_user_handler(caller: Caller) -> Result<HttpResponse, AppError> {
  let user = require_authenticated(caller.user())?;
  Ok(HttpResponse::Ok().json(user))
}
