// tests/pg_store_tests.rs

//! Checkout and settlement against PostgreSQL through `PgStore`.
//!
//! Needs `DATABASE_URL` pointing at a disposable database; every test returns
//! early when it is unset. The schema comes from the server crate's migrations.
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test pg_store_tests -- --nocapture

mod common;

use common::*;
use serial_test::serial;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use storefront::models::{CartItem, OrderStatus, PaymentStatus};
use storefront::payment::PaymentGateway;
use storefront::store::{OrderLedger, PgStore};
use storefront::{CheckoutOrchestrator, CheckoutRequest, SettlementOutcome, SettlementReconciler, ShopError};

async fn connect_and_migrate() -> Option<PgPool> {
  let Ok(url) = std::env::var("DATABASE_URL") else {
    println!("DATABASE_URL not set; skipping PostgreSQL store tests.");
    return None;
  };

  let pool = PgPoolOptions::new()
    .max_connections(4)
    .connect(&url)
    .await
    .expect("Failed to connect to PostgreSQL");

  sqlx::migrate!("../server/migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  Some(pool)
}

struct Fixture {
  pool: PgPool,
  store: PgStore,
  user_id: i64,
  mug: i64,
  towel: i64,
}

/// A fresh buyer plus two products: a mug (1000, 5 in stock) and a towel (800, 1 in stock).
async fn fixture() -> Option<Fixture> {
  let pool = connect_and_migrate().await?;

  // txid_current() differs per statement, so emails never collide across runs.
  let user_id: i64 = sqlx::query_scalar(
    "INSERT INTO users (name, email, password_hash) \
     VALUES ('Buyer', 'buyer-' || txid_current() || '@example.com', 'unused') RETURNING id",
  )
  .fetch_one(&pool)
  .await
  .expect("insert user");

  let product = |name: &'static str, price: i64, stock: i64| {
    let pool = pool.clone();
    async move {
      sqlx::query_scalar::<_, i64>("INSERT INTO products (name, price, stock) VALUES ($1, $2, $3) RETURNING id")
        .bind(name)
        .bind(price)
        .bind(stock)
        .fetch_one(&pool)
        .await
        .expect("insert product")
    }
  };
  let mug = product("Mug", 1000, 5).await;
  let towel = product("Towel", 800, 1).await;

  Some(Fixture {
    store: PgStore::new(pool.clone()),
    pool,
    user_id,
    mug,
    towel,
  })
}

impl Fixture {
  fn checkout_with(&self, gateway: Arc<dyn PaymentGateway>) -> CheckoutOrchestrator {
    let shared = Arc::new(self.store.clone());
    CheckoutOrchestrator::new(shared.clone(), shared, gateway, settings())
  }

  fn request(&self, items: &[(i64, i64)]) -> CheckoutRequest {
    CheckoutRequest {
      user_id: self.user_id,
      email: "buyer@example.com".to_string(),
      items: items
        .iter()
        .map(|&(product_id, quantity)| CartItem { product_id, quantity })
        .collect(),
      shipping_address: "1-2-3 Shibuya, Tokyo".to_string(),
    }
  }

  async fn pending_order(&self, items: &[(i64, i64)]) -> i64 {
    self
      .checkout_with(Arc::new(RecordingGateway::default()))
      .checkout(self.request(items))
      .await
      .expect("checkout against postgres")
      .order_id
  }

  fn reconciler(&self) -> SettlementReconciler {
    SettlementReconciler::new(Arc::new(self.store.clone()), verifier())
  }

  async fn settle(&self, order_id: i64, user_id: i64) -> Result<SettlementOutcome, ShopError> {
    let payload = completed_event(order_id, user_id);
    self.reconciler().reconcile_at(&payload, Some(&sign(&payload)), NOW).await
  }

  /// (stock, sales_count)
  async fn inventory(&self, product_id: i64) -> (i64, i64) {
    sqlx::query_as("SELECT stock, sales_count FROM products WHERE id = $1")
      .bind(product_id)
      .fetch_one(&self.pool)
      .await
      .expect("read inventory")
  }

  async fn set_stock(&self, product_id: i64, stock: i64) {
    sqlx::query("UPDATE products SET stock = $1 WHERE id = $2")
      .bind(stock)
      .bind(product_id)
      .execute(&self.pool)
      .await
      .expect("set stock");
  }

  async fn order_state(&self, order_id: i64) -> (OrderStatus, PaymentStatus) {
    let order = self.store.find_order(order_id).await.unwrap().expect("order exists");
    (order.status, order.payment_status)
  }
}

#[tokio::test]
#[serial]
async fn checkout_commits_pending_order_with_price_snapshots() {
  setup_tracing();
  let Some(fx) = fixture().await else { return };

  let order_id = fx.pending_order(&[(fx.mug, 2), (fx.towel, 1)]).await;

  let order = fx.store.find_order(order_id).await.unwrap().unwrap();
  assert_eq!(order.user_id, fx.user_id);
  assert_eq!(order.total_price, 2 * 1000 + 800 + SHIPPING);
  assert_eq!((order.status, order.payment_status), (OrderStatus::Pending, PaymentStatus::Unpaid));

  let lines = fx.store.order_lines(order_id).await.unwrap();
  let snapshot: Vec<(Option<i64>, &str, i64, i64)> = lines
    .iter()
    .map(|l| (l.product_id, l.product_name.as_str(), l.quantity, l.unit_price))
    .collect();
  assert_eq!(
    snapshot,
    vec![(Some(fx.mug), "Mug", 2, 1000), (Some(fx.towel), "Towel", 1, 800)]
  );
  assert_eq!(fx.inventory(fx.mug).await, (5, 0));
}

#[tokio::test]
#[serial]
async fn failed_payment_session_leaves_no_order_rows() {
  setup_tracing();
  let Some(fx) = fixture().await else { return };

  let err = fx
    .checkout_with(Arc::new(FailingGateway))
    .checkout(fx.request(&[(fx.mug, 1)]))
    .await
    .unwrap_err();
  assert!(matches!(err, ShopError::PaymentSessionCreationFailed(_)));

  let orders = fx.store.orders_for_user(fx.user_id).await.unwrap();
  assert!(orders.is_empty());
}

#[tokio::test]
#[serial]
async fn settlement_marks_paid_and_decrements_once() {
  setup_tracing();
  let Some(fx) = fixture().await else { return };
  let order_id = fx.pending_order(&[(fx.mug, 2)]).await;

  assert_eq!(fx.settle(order_id, fx.user_id).await.unwrap(), SettlementOutcome::Settled { order_id });
  assert_eq!(fx.order_state(order_id).await, (OrderStatus::Processing, PaymentStatus::Paid));
  assert_eq!(fx.inventory(fx.mug).await, (3, 2));

  assert_eq!(
    fx.settle(order_id, fx.user_id).await.unwrap(),
    SettlementOutcome::AlreadySettled { order_id }
  );
  assert_eq!(fx.inventory(fx.mug).await, (3, 2));
}

#[tokio::test]
#[serial]
async fn settlement_for_another_user_changes_nothing() {
  setup_tracing();
  let Some(fx) = fixture().await else { return };
  let order_id = fx.pending_order(&[(fx.mug, 1)]).await;

  assert_eq!(
    fx.settle(order_id, fx.user_id + 1_000_000).await.unwrap(),
    SettlementOutcome::AlreadySettled { order_id }
  );
  assert_eq!(fx.order_state(order_id).await, (OrderStatus::Pending, PaymentStatus::Unpaid));
  assert_eq!(fx.inventory(fx.mug).await, (5, 0));
}

#[tokio::test]
#[serial]
async fn stock_sold_out_after_checkout_rolls_back_whole_settlement() {
  setup_tracing();
  let Some(fx) = fixture().await else { return };
  // The towel line is decremented first, then the mug line fails.
  let order_id = fx.pending_order(&[(fx.towel, 1), (fx.mug, 2)]).await;
  fx.set_stock(fx.mug, 1).await;

  let err = fx.settle(order_id, fx.user_id).await.unwrap_err();
  assert!(matches!(
    err,
    ShopError::StockReconciliationFailed { order_id: failed, product_id: Some(pid) }
      if failed == order_id && pid == fx.mug
  ));

  assert_eq!(fx.order_state(order_id).await, (OrderStatus::Pending, PaymentStatus::Unpaid));
  assert_eq!(fx.inventory(fx.towel).await, (1, 0));
  assert_eq!(fx.inventory(fx.mug).await, (1, 0));

  // Once restocked, the processor's retry goes through.
  fx.set_stock(fx.mug, 2).await;
  assert_eq!(fx.settle(order_id, fx.user_id).await.unwrap(), SettlementOutcome::Settled { order_id });
  assert_eq!(fx.inventory(fx.mug).await, (0, 2));
}

#[tokio::test]
#[serial]
async fn deleted_product_blocks_settlement() {
  setup_tracing();
  let Some(fx) = fixture().await else { return };
  let order_id = fx.pending_order(&[(fx.mug, 1)]).await;

  sqlx::query("DELETE FROM products WHERE id = $1")
    .bind(fx.mug)
    .execute(&fx.pool)
    .await
    .unwrap();
  let lines = fx.store.order_lines(order_id).await.unwrap();
  assert_eq!(lines[0].product_id, None);
  assert_eq!(lines[0].product_name, "Mug");

  let err = fx.settle(order_id, fx.user_id).await.unwrap_err();
  assert!(matches!(
    err,
    ShopError::StockReconciliationFailed { order_id: failed, product_id: None } if failed == order_id
  ));
  assert_eq!(fx.order_state(order_id).await, (OrderStatus::Pending, PaymentStatus::Unpaid));
}
