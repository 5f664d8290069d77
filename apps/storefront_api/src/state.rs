// apps/storefront_api/src/state.rs
use crate::config::AppConfig;
use crate::services::notifications::Notifier;
use std::sync::Arc;
use storefront::Datastore;

#[derive(Clone)]
pub struct AppState {
  pub datastore: Arc<dyn Datastore>,
  pub notifier: Notifier,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new(datastore: Arc<dyn Datastore>, notifier: Notifier, config: AppConfig) -> Self {
    AppState {
      datastore,
      notifier,
      config: Arc::new(config),
    }
  }

  pub fn ds(&self) -> &dyn Datastore {
    self.datastore.as_ref()
  }
}
