// apps/storefront_api/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  /// `None` runs the server on the in-memory datastore.
  pub database_url: Option<String>,
  pub database_max_connections: u32,

  pub token_ttl_minutes: i64,

  pub default_page_size: u32,
  pub max_page_size: u32,

  pub notification_queue_capacity: usize,
  pub notification_sender: String,

  // Bootstrap superuser, created at startup when `seed_db` is set.
  pub seed_db: bool,
  pub admin_username: Option<String>,
  pub admin_password: Option<String>,
}

impl Default for AppConfig {
  fn default() -> Self {
    AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      database_max_connections: 10,
      token_ttl_minutes: 60 * 24,
      default_page_size: storefront::query::DEFAULT_PAGE_SIZE,
      max_page_size: storefront::query::MAX_PAGE_SIZE,
      notification_queue_capacity: 256,
      notification_sender: "noreply@storefront.local".to_string(),
      seed_db: false,
      admin_username: None,
      admin_password: None,
    }
  }
}

fn optional_var(name: &str) -> Option<String> {
  env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: Display,
{
  match optional_var(name) {
    Some(raw) => raw
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e))),
    None => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    let defaults = AppConfig::default();

    let config = AppConfig {
      server_host: optional_var("SERVER_HOST").unwrap_or(defaults.server_host),
      server_port: parse_var("SERVER_PORT", defaults.server_port)?,
      database_url: optional_var("DATABASE_URL"),
      database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
      token_ttl_minutes: parse_var("TOKEN_TTL_MINUTES", defaults.token_ttl_minutes)?,
      default_page_size: parse_var("DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
      max_page_size: parse_var("MAX_PAGE_SIZE", defaults.max_page_size)?,
      notification_queue_capacity: parse_var("NOTIFICATION_QUEUE_CAPACITY", defaults.notification_queue_capacity)?,
      notification_sender: optional_var("NOTIFICATION_SENDER").unwrap_or(defaults.notification_sender),
      seed_db: parse_var("SEED_DB", false)?,
      admin_username: optional_var("ADMIN_USERNAME"),
      admin_password: optional_var("ADMIN_PASSWORD"),
    };
    config.check()?;

    tracing::info!(
      host = %config.server_host,
      port = config.server_port,
      persistent = config.database_url.is_some(),
      "Application configuration loaded successfully."
    );
    Ok(config)
  }

  fn check(&self) -> Result<()> {
    if self.token_ttl_minutes <= 0 {
      return Err(AppError::Config("TOKEN_TTL_MINUTES must be positive".to_string()));
    }
    if self.default_page_size == 0 || self.max_page_size == 0 {
      return Err(AppError::Config("page sizes must be positive".to_string()));
    }
    if self.default_page_size > self.max_page_size {
      return Err(AppError::Config(format!(
        "DEFAULT_PAGE_SIZE ({}) exceeds MAX_PAGE_SIZE ({})",
        self.default_page_size, self.max_page_size
      )));
    }
    if self.notification_queue_capacity == 0 {
      return Err(AppError::Config("NOTIFICATION_QUEUE_CAPACITY must be positive".to_string()));
    }
    Ok(())
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
