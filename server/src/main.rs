// server/src/main.rs

mod config;
mod errors;
mod models;
mod state;
mod web;

use crate::config::AppConfig;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront::payment::{SignatureVerifier, StripeGateway};
use storefront::store::PgStore;
use storefront::{CheckoutOrchestrator, SettlementReconciler, TokenIssuer};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = Arc::new(AppConfig::from_env().context("loading configuration")?);

  let db_pool = PgPoolOptions::new()
    .max_connections(app_config.db_max_connections)
    .connect(&app_config.database_url)
    .await
    .context("connecting to the database")?;
  tracing::info!("Connected to the database.");

  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .context("running database migrations")?;

  let store = PgStore::new(db_pool.clone());
  let gateway = StripeGateway::new(
    app_config.stripe_secret_key.clone(),
    app_config.stripe_api_base.clone(),
    app_config.payment_timeout,
  )
  .context("building payment gateway client")?;
  let verifier =
    SignatureVerifier::new(app_config.stripe_webhook_secret.clone()).with_tolerance(app_config.webhook_tolerance);

  let checkout = CheckoutOrchestrator::new(
    Arc::new(store.clone()),
    Arc::new(store.clone()),
    Arc::new(gateway),
    app_config.checkout_settings(),
  );
  let settlement = SettlementReconciler::new(Arc::new(store.clone()), verifier);
  tracing::info!(
    checkout_steps = ?checkout.step_names(),
    settlement_steps = ?settlement.step_names(),
    "Order pipelines ready."
  );

  let app_state = AppState {
    db_pool: db_pool.clone(),
    store,
    checkout: Arc::new(checkout),
    settlement: Arc::new(settlement),
    tokens: TokenIssuer::new(app_config.jwt_secret.as_bytes(), app_config.token_ttl),
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::routes::configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {server_address}"))?
  .run()
  .await?;

  db_pool.close().await;
  tracing::info!("Server stopped.");
  Ok(())
}
