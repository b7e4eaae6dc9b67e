// server/src/state.rs

use crate::config::AppConfig;
use sqlx::PgPool;
use std::sync::Arc;
use storefront::store::PgStore;
use storefront::{CheckoutOrchestrator, SettlementReconciler, TokenIssuer};

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub store: PgStore,
  pub checkout: Arc<CheckoutOrchestrator>,
  pub settlement: Arc<SettlementReconciler>,
  pub tokens: TokenIssuer,
  pub config: Arc<AppConfig>,
}
