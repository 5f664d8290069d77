// apps/storefront_api/src/lib.rs

//! HTTP front end for the storefront domain.

pub mod config;
pub mod errors;
pub mod services;
pub mod state;
pub mod web;

use anyhow::Context;
use std::sync::Arc;
use storefront::{Datastore, MemoryDatastore, PgDatastore};

use crate::config::AppConfig;

/// PostgreSQL when `DATABASE_URL` is configured (migrations applied), otherwise
/// an empty in-memory datastore.
pub async fn build_datastore(config: &AppConfig) -> anyhow::Result<Arc<dyn Datastore>> {
  match &config.database_url {
    Some(url) => {
      let pg = PgDatastore::connect(url, config.database_max_connections).await?;
      pg.migrate().await?;
      tracing::info!("Connected to PostgreSQL and applied migrations.");
      Ok(Arc::new(pg))
    }
    None => {
      tracing::warn!("DATABASE_URL not set; using the in-memory datastore. Data is lost on exit.");
      Ok(Arc::new(MemoryDatastore::new()))
    }
  }
}

/// Creates the bootstrap superuser when seeding is enabled.
pub async fn seed(config: &AppConfig, ds: &dyn Datastore) -> anyhow::Result<()> {
  if !config.seed_db {
    return Ok(());
  }
  match (&config.admin_username, &config.admin_password) {
    (Some(username), Some(password)) => {
      services::auth_service::ensure_superuser(ds, username, password)
        .await
        .context("failed to seed the bootstrap superuser")?;
      Ok(())
    }
    _ => {
      tracing::warn!("SEED_DB is set but ADMIN_USERNAME/ADMIN_PASSWORD are missing; nothing seeded.");
      Ok(())
    }
  }
}
