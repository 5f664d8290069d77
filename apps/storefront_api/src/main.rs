// apps/storefront_api/src/main.rs

use actix_web::{middleware, web as actix_data, App, HttpServer};
use anyhow::Context;
use storefront_api::config::AppConfig;
use storefront_api::services::notifications::Notifier;
use storefront_api::state::AppState;
use storefront_api::{build_datastore, seed, web};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = AppConfig::from_env().context("failed to load application configuration")?;
  let datastore = build_datastore(&app_config).await?;
  seed(&app_config, datastore.as_ref()).await?;

  let (notifier, _worker) = Notifier::start(
    app_config.notification_queue_capacity,
    app_config.notification_sender.clone(),
  );

  let server_address = app_config.bind_address();
  let app_state = AppState::new(datastore, notifier, app_config);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(middleware::NormalizePath::trim())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app)
  })
  .bind(&server_address)
  .with_context(|| format!("failed to bind {}", server_address))?
  .run()
  .await
  .context("server terminated with an error")
}
