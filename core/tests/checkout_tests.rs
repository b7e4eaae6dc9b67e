// tests/checkout_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use storefront::models::{OrderStatus, PaymentStatus};
use storefront::store::OrderLedger;
use storefront::ShopError;

#[tokio::test]
#[serial]
async fn checkout_opens_pending_order_priced_from_catalog() {
  setup_tracing();
  let store = seeded_store();
  let gateway = Arc::new(RecordingGateway::default());
  let checkout = orchestrator(&store, gateway.clone());

  let receipt = checkout.checkout(cart_request(&[(MUG, 2)])).await.unwrap();

  assert_eq!(receipt.total_price, 2 * 1000 + SHIPPING);
  assert_eq!(receipt.url, "https://pay.example.com/c/cs_test_1");

  let order = store.find_order(receipt.order_id).await.unwrap().unwrap();
  assert_eq!(order.total_price, 2500);
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.payment_status, PaymentStatus::Unpaid);
  assert_eq!(order.user_id, 7);

  let lines = store.order_lines(receipt.order_id).await.unwrap();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0].product_id, Some(MUG));
  assert_eq!(lines[0].product_name, "Ceramic Mug");
  assert_eq!(lines[0].quantity, 2);
  assert_eq!(lines[0].unit_price, 1000);

  // checkout never touches stock
  assert_eq!(store.stock_of(MUG), Some(5));
}

#[tokio::test]
#[serial]
async fn session_request_carries_lines_shipping_and_metadata() {
  setup_tracing();
  let store = seeded_store();
  let gateway = Arc::new(RecordingGateway::default());
  let checkout = orchestrator(&store, gateway.clone());

  let receipt = checkout.checkout(cart_request(&[(MUG, 1), (TOWEL, 1)])).await.unwrap();
  let sent = gateway.last_request().unwrap();

  assert_eq!(sent.order_id, receipt.order_id);
  assert_eq!(sent.user_id, 7);
  assert_eq!(sent.customer_email, "buyer@example.com");
  assert_eq!(sent.currency, "jpy");
  assert_eq!(sent.success_url, "https://shop.example.com/account?session_id={CHECKOUT_SESSION_ID}");
  assert_eq!(sent.cancel_url, "https://shop.example.com/order-confirm");

  let names: Vec<&str> = sent.line_items.iter().map(|l| l.name.as_str()).collect();
  assert_eq!(names, vec!["Ceramic Mug", "Tea Towel", "Shipping"]);
  assert_eq!(sent.line_items[2].unit_amount, SHIPPING);
  assert_eq!(receipt.total_price, 1000 + 800 + SHIPPING);
}

#[tokio::test]
#[serial]
async fn duplicate_cart_lines_are_merged() {
  setup_tracing();
  let store = seeded_store();
  let checkout = orchestrator(&store, Arc::new(RecordingGateway::default()));

  let receipt = checkout.checkout(cart_request(&[(MUG, 1), (MUG, 2)])).await.unwrap();

  let lines = store.order_lines(receipt.order_id).await.unwrap();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0].quantity, 3);
  assert_eq!(receipt.total_price, 3000 + SHIPPING);
}

#[tokio::test]
#[serial]
async fn unknown_product_fails_and_persists_nothing() {
  setup_tracing();
  let store = seeded_store();
  let gateway = Arc::new(RecordingGateway::default());
  let checkout = orchestrator(&store, gateway.clone());

  let err = checkout.checkout(cart_request(&[(MUG, 1), (99, 1)])).await.unwrap_err();

  match err {
    ShopError::CartProductNotFound { ids } => assert_eq!(ids, vec![99]),
    other => panic!("unexpected error: {other:?}"),
  }
  assert_eq!(store.order_count(), 0);
  assert!(gateway.last_request().is_none());
}

#[tokio::test]
#[serial]
async fn insufficient_stock_names_every_short_product() {
  setup_tracing();
  let store = seeded_store();
  let checkout = orchestrator(&store, Arc::new(RecordingGateway::default()));

  let err = checkout.checkout(cart_request(&[(MUG, 6), (TOWEL, 2)])).await.unwrap_err();

  assert!(matches!(err, ShopError::InsufficientStock { .. }));
  assert_eq!(err.to_string(), "Out of stock products: Ceramic Mug, Tea Towel");
  assert_eq!(store.order_count(), 0);
}

#[tokio::test]
#[serial]
async fn empty_cart_bad_quantity_and_blank_address_are_rejected() {
  setup_tracing();
  let store = seeded_store();
  let checkout = orchestrator(&store, Arc::new(RecordingGateway::default()));

  let err = checkout.checkout(cart_request(&[])).await.unwrap_err();
  assert!(matches!(err, ShopError::InvalidCart(_)));

  let err = checkout.checkout(cart_request(&[(MUG, 0)])).await.unwrap_err();
  assert!(matches!(err, ShopError::InvalidCart(_)));

  let mut request = cart_request(&[(MUG, 1)]);
  request.shipping_address = "   ".to_string();
  let err = checkout.checkout(request).await.unwrap_err();
  assert!(matches!(err, ShopError::InvalidAddress));

  assert_eq!(store.order_count(), 0);
}

#[tokio::test]
#[serial]
async fn payment_failure_rolls_back_the_order() {
  setup_tracing();
  let store = seeded_store();
  let checkout = orchestrator(&store, Arc::new(FailingGateway));

  let err = checkout.checkout(cart_request(&[(MUG, 2)])).await.unwrap_err();

  assert!(matches!(err, ShopError::PaymentSessionCreationFailed(_)));
  assert_eq!(store.order_count(), 0);
  assert_eq!(store.line_count(), 0);
}

#[tokio::test]
#[serial]
async fn payment_timeout_rolls_back_the_order() {
  setup_tracing();
  let store = seeded_store();
  let mut short = settings();
  short.payment_timeout = Duration::from_millis(20);
  let checkout = orchestrator_with(
    &store,
    Arc::new(StalledGateway {
      delay: Duration::from_millis(500),
    }),
    short,
  );

  let err = checkout.checkout(cart_request(&[(MUG, 1)])).await.unwrap_err();

  assert!(matches!(err, ShopError::PaymentSessionCreationFailed(_)));
  assert_eq!(store.order_count(), 0);
}

#[tokio::test]
#[serial]
async fn checkout_steps_run_in_declared_order() {
  let store = seeded_store();
  let checkout = orchestrator(&store, Arc::new(RecordingGateway::default()));
  assert_eq!(
    checkout.step_names(),
    vec![
      "validate_cart",
      "resolve_products",
      "check_stock",
      "price_order",
      "open_order",
      "create_payment_session",
      "commit_order",
    ]
  );
}
