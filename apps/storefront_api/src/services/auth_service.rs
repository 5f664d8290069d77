// apps/storefront_api/src/services/auth_service.rs

//! Accounts and access tokens: registration, password sign-in, and resolving
//! a bearer token back to its user.
//!
//! Tokens are opaque random strings stored by the datastore with an expiry.

use crate::errors::AppError;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{DateTime, Duration, Utc};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use storefront::models::{NewUser, User};
use storefront::validation::FieldErrors;
use storefront::{Datastore, StoreError};
use tracing::{debug, error, info, instrument, warn};

pub const MIN_PASSWORD_LEN: usize = 8;
const TOKEN_BYTES: usize = 32;
const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name: String,
}

impl Registration {
  fn validate(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.check_text("username", &self.username, 150);
    if self.password.is_empty() {
      errors.add("password", storefront::validation::BLANK);
    } else if self.password.chars().count() < MIN_PASSWORD_LEN {
      errors.add(
        "password",
        format!(
          "This password is too short. It must contain at least {} characters.",
          MIN_PASSWORD_LEN
        ),
      );
    }
    if !self.email.is_empty() && !self.email.contains('@') {
      errors.add("email", "Enter a valid email address.");
    }
    errors
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
  pub access: String,
  pub expires_at: DateTime<Utc>,
}

/// Hashes a plain-text password using Argon2 with a random salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(StoreError::invalid("password", storefront::validation::BLANK).into());
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(hash) => {
      debug!("Password hashed successfully.");
      Ok(hash.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// `Ok(false)` is a wrong password; `Err` means the stored hash is unusable.
#[instrument(name = "auth_service::verify_password", skip(stored_hash, provided_password), err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(other) => {
      error!(error = %other, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!("Password verification process failed: {}", other)))
    }
  }
}

fn generate_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Creates the user and its customer record.
#[instrument(name = "auth_service::register", skip(ds, registration), fields(username = %registration.username), err(Display))]
pub async fn register(ds: &dyn Datastore, registration: &Registration) -> Result<User, AppError> {
  registration.validate().into_result()?;
  if ds.find_user_by_username(registration.username.trim()).await?.is_some() {
    return Err(StoreError::invalid("username", "A user with that username already exists.").into());
  }

  let password_hash = hash_password(&registration.password)?;
  let user = ds
    .create_user(&NewUser {
      username: registration.username.trim().to_string(),
      email: registration.email.clone(),
      first_name: registration.first_name.clone(),
      last_name: registration.last_name.clone(),
      password_hash,
      ..Default::default()
    })
    .await?;
  ds.ensure_customer(user.id).await?;
  info!(user_id = user.id, "User registered.");
  Ok(user)
}

#[instrument(name = "auth_service::sign_in", skip(ds, credentials), fields(username = %credentials.username), err(Display))]
pub async fn sign_in(ds: &dyn Datastore, credentials: &Credentials, ttl_minutes: i64) -> Result<IssuedToken, AppError> {
  let user = match ds.find_user_by_username(credentials.username.trim()).await? {
    Some(user) => user,
    None => {
      warn!("Sign-in for unknown username.");
      return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
    }
  };
  if !verify_password(&user.password_hash, &credentials.password)? {
    warn!(user_id = user.id, "Sign-in with wrong password.");
    return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
  }

  let access = generate_token();
  let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
  ds.store_token(&access, user.id, expires_at).await?;
  info!(user_id = user.id, %expires_at, "Access token issued.");
  Ok(IssuedToken { access, expires_at })
}

/// The user owning `token`, if the token exists and has not expired.
pub async fn authenticate(ds: &dyn Datastore, token: &str) -> Result<User, AppError> {
  ds.find_user_by_token(token, Utc::now())
    .await?
    .ok_or_else(|| AppError::Auth("Given token not valid for any token type".to_string()))
}

/// Creates the bootstrap superuser unless a user with that name exists.
#[instrument(name = "auth_service::ensure_superuser", skip(ds, password), err(Display))]
pub async fn ensure_superuser(ds: &dyn Datastore, username: &str, password: &str) -> Result<User, AppError> {
  if let Some(existing) = ds.find_user_by_username(username).await? {
    debug!(user_id = existing.id, "Bootstrap superuser already present.");
    return Ok(existing);
  }
  let user = ds
    .create_user(&NewUser {
      username: username.to_string(),
      password_hash: hash_password(password)?,
      is_staff: true,
      is_superuser: true,
      ..Default::default()
    })
    .await?;
  info!(user_id = user.id, "Bootstrap superuser created.");
  Ok(user)
}

#[cfg(test)]
mod tests {
  use super::*;
  use storefront::MemoryDatastore;

  fn registration(username: &str, password: &str) -> Registration {
    Registration {
      username: username.to_string(),
      password: password.to_string(),
      email: String::new(),
      first_name: String::new(),
      last_name: String::new(),
    }
  }

  #[test]
  fn hashes_verify_only_their_password() {
    let hash = hash_password("correct horse").unwrap();
    assert!(verify_password(&hash, "correct horse").unwrap());
    assert!(!verify_password(&hash, "battery staple").unwrap());
    assert!(!verify_password(&hash, "").unwrap());
  }

  #[test]
  fn tokens_are_long_and_distinct() {
    let a = generate_token();
    assert_eq!(a.len(), TOKEN_BYTES * 2);
    assert_ne!(a, generate_token());
  }

  #[tokio::test]
  async fn register_then_sign_in_then_authenticate() {
    let ds = MemoryDatastore::new();
    let user = register(&ds, &registration("dana", "s3cret-pass")).await.unwrap();
    assert!(ds.find_customer_by_user(user.id).await.unwrap().is_some());

    let token = sign_in(
      &ds,
      &Credentials {
        username: "dana".to_string(),
        password: "s3cret-pass".to_string(),
      },
      5,
    )
    .await
    .unwrap();
    let resolved = authenticate(&ds, &token.access).await.unwrap();
    assert_eq!(resolved.id, user.id);

    let wrong = sign_in(
      &ds,
      &Credentials {
        username: "dana".to_string(),
        password: "nope-nope".to_string(),
      },
      5,
    )
    .await;
    assert!(matches!(wrong, Err(AppError::Auth(_))));
  }

  #[tokio::test]
  async fn short_passwords_and_taken_usernames_are_field_errors() {
    let ds = MemoryDatastore::new();
    let short = register(&ds, &registration("eve", "short")).await.unwrap_err();
    assert!(matches!(short, AppError::Store(ref e) if e.field_errors().unwrap().contains("password")));

    register(&ds, &registration("eve", "long-enough")).await.unwrap();
    let taken = register(&ds, &registration("eve", "long-enough")).await.unwrap_err();
    assert!(matches!(taken, AppError::Store(ref e) if e.field_errors().unwrap().contains("username")));
  }

  #[tokio::test]
  async fn expired_tokens_do_not_authenticate() {
    let ds = MemoryDatastore::new();
    let user = register(&ds, &registration("finn", "long-enough")).await.unwrap();
    ds.store_token("stale", user.id, Utc::now() - Duration::minutes(1))
      .await
      .unwrap();
    assert!(matches!(authenticate(&ds, "stale").await, Err(AppError::Auth(_))));
  }
}
