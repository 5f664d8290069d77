// apps/storefront_api/src/web/extractors.rs

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::{ready, FutureExt, LocalBoxFuture};
use storefront::models::User;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;

/// Schemes accepted in the `Authorization` header.
const SCHEMES: [&str; 2] = ["JWT", "Bearer"];

/// The caller behind a request. `None` for anonymous requests.
///
/// A missing `Authorization` header is anonymous. A header that is present
/// but malformed, or carries an unknown or expired token, rejects the request
/// with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<User>);

impl Caller {
  pub fn user(&self) -> Option<&User> {
    self.0.as_ref()
  }

  pub fn id(&self) -> Option<i64> {
    self.0.as_ref().map(|u| u.id)
  }
}

fn bearer_token(req: &HttpRequest) -> Result<Option<String>, AppError> {
  let raw = match req.headers().get(header::AUTHORIZATION) {
    Some(value) => value
      .to_str()
      .map_err(|_| AppError::Auth("Authorization header is not valid text.".to_string()))?,
    None => return Ok(None),
  };

  let mut parts = raw.split_whitespace();
  match (parts.next(), parts.next(), parts.next()) {
    (Some(scheme), Some(token), None) if SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) => {
      Ok(Some(token.to_string()))
    }
    _ => {
      warn!("Rejected malformed Authorization header.");
      Err(AppError::Auth(
        "Authorization header must contain two space-delimited values.".to_string(),
      ))
    }
  }
}

impl FromRequest for Caller {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = match bearer_token(req) {
      Ok(Some(token)) => token,
      Ok(None) => return ready(Ok(Caller(None))).boxed_local(),
      Err(e) => return ready(Err(e)).boxed_local(),
    };
    let state = req.app_data::<web::Data<AppState>>().cloned();

    async move {
      let state = state.ok_or_else(|| AppError::Internal("application state is not configured".to_string()))?;
      let user = auth_service::authenticate(state.ds(), &token).await?;
      debug!(user_id = user.id, "Request authenticated.");
      Ok(Caller(Some(user)))
    }
    .boxed_local()
  }
}
