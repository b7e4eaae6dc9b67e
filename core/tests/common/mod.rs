// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use storefront::models::CatalogEntry;
use storefront::payment::{CheckoutSessionRequest, PaymentGateway, PaymentSession, SignatureVerifier};
use storefront::store::MemoryStore;
use storefront::{CheckoutOrchestrator, CheckoutRequest, CheckoutSettings, PipelineError, ShopError, ShopResult};
use tracing::Level;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const NOW: i64 = 1_700_000_000;
pub const SHIPPING: i64 = 500;

pub const MUG: i64 = 1;
pub const TOWEL: i64 = 2;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Catalog ---

pub fn seeded_store() -> MemoryStore {
  MemoryStore::with_products([
    CatalogEntry {
      id: MUG,
      name: "Ceramic Mug".to_string(),
      price: 1000,
      stock: 5,
    },
    CatalogEntry {
      id: TOWEL,
      name: "Tea Towel".to_string(),
      price: 800,
      stock: 1,
    },
  ])
}

// --- Payment gateways ---

#[derive(Default)]
pub struct RecordingGateway {
  pub requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl RecordingGateway {
  pub fn last_request(&self) -> Option<CheckoutSessionRequest> {
    self.requests.lock().last().cloned()
  }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
  async fn create_session(&self, request: &CheckoutSessionRequest) -> ShopResult<PaymentSession> {
    let mut requests = self.requests.lock();
    requests.push(request.clone());
    let n = requests.len();
    Ok(PaymentSession {
      id: format!("cs_test_{n}"),
      url: format!("https://pay.example.com/c/cs_test_{n}"),
    })
  }
}

pub struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
  async fn create_session(&self, _request: &CheckoutSessionRequest) -> ShopResult<PaymentSession> {
    Err(ShopError::PaymentSessionCreationFailed("processor unavailable".to_string()))
  }
}

pub struct StalledGateway {
  pub delay: Duration,
}

#[async_trait]
impl PaymentGateway for StalledGateway {
  async fn create_session(&self, _request: &CheckoutSessionRequest) -> ShopResult<PaymentSession> {
    tokio::time::sleep(self.delay).await;
    Ok(PaymentSession {
      id: "cs_late".to_string(),
      url: "https://pay.example.com/c/cs_late".to_string(),
    })
  }
}

// --- Builders ---

pub fn settings() -> CheckoutSettings {
  CheckoutSettings {
    shipping_cost: SHIPPING,
    currency: "jpy".to_string(),
    frontend_base_url: "https://shop.example.com".to_string(),
    payment_timeout: Duration::from_secs(2),
  }
}

pub fn orchestrator(store: &MemoryStore, gateway: Arc<dyn PaymentGateway>) -> CheckoutOrchestrator {
  orchestrator_with(store, gateway, settings())
}

pub fn orchestrator_with(
  store: &MemoryStore,
  gateway: Arc<dyn PaymentGateway>,
  settings: CheckoutSettings,
) -> CheckoutOrchestrator {
  let shared = Arc::new(store.clone());
  CheckoutOrchestrator::new(shared.clone(), shared, gateway, settings)
}

pub fn cart_request(items: &[(i64, i64)]) -> CheckoutRequest {
  CheckoutRequest {
    user_id: 7,
    email: "buyer@example.com".to_string(),
    items: items
      .iter()
      .map(|(product_id, quantity)| storefront::models::CartItem {
        product_id: *product_id,
        quantity: *quantity,
      })
      .collect(),
    shipping_address: "1-2-3 Shibuya, Tokyo".to_string(),
  }
}

// --- Webhook events ---

pub fn verifier() -> SignatureVerifier {
  SignatureVerifier::new(WEBHOOK_SECRET)
}

pub fn event_payload(event_type: &str, order_id: &str, user_id: &str) -> Vec<u8> {
  serde_json::json!({
    "id": "evt_test_1",
    "type": event_type,
    "data": { "object": { "id": "cs_test_1", "metadata": { "orderId": order_id, "userId": user_id } } }
  })
  .to_string()
  .into_bytes()
}

pub fn completed_event(order_id: i64, user_id: i64) -> Vec<u8> {
  event_payload("checkout.session.completed", &order_id.to_string(), &user_id.to_string())
}

pub fn sign(payload: &[u8]) -> String {
  verifier().sign(NOW, payload).expect("signing with a test secret")
}

// --- Pipeline engine fixtures ---

#[derive(Debug, Default)]
pub struct TraceCtx {
  pub visited: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TestError {
  #[error("engine: {0}")]
  Engine(String),
  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(e: PipelineError) -> Self {
    TestError::Engine(e.to_string())
  }
}
