// core/src/payment/mod.rs

//! The external payment processor: hosted checkout sessions out, signed
//! webhook events in.

pub mod stripe;
pub mod webhook;

use crate::error::ShopResult;
use async_trait::async_trait;

pub use stripe::StripeGateway;
pub use webhook::{PaymentEvent, SignatureVerifier, CHECKOUT_SESSION_COMPLETED};

/// One line shown on the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
  pub name: String,
  pub unit_amount: i64,
  pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
  pub order_id: i64,
  pub user_id: i64,
  pub customer_email: String,
  pub currency: String,
  pub line_items: Vec<SessionLineItem>,
  pub success_url: String,
  pub cancel_url: String,
}

/// A created session: the processor's id and the URL to redirect the buyer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
  pub id: String,
  pub url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_session(&self, request: &CheckoutSessionRequest) -> ShopResult<PaymentSession>;
}
