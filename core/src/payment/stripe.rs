// core/src/payment/stripe.rs

use super::{CheckoutSessionRequest, PaymentGateway, PaymentSession};
use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Deserialize)]
struct SessionResponse {
  id: String,
  url: Option<String>,
}

/// Creates Stripe Checkout sessions over the REST API.
pub struct StripeGateway {
  client: Client,
  api_base: String,
  secret_key: String,
}

impl StripeGateway {
  pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>, timeout: Duration) -> ShopResult<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| ShopError::Internal(format!("failed to build HTTP client: {e}")))?;

    Ok(Self {
      client,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    })
  }

  /// Flattens the request into Stripe's bracketed form encoding.
  fn form_params(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut params = vec![
      ("mode".to_string(), "payment".to_string()),
      ("success_url".to_string(), request.success_url.clone()),
      ("cancel_url".to_string(), request.cancel_url.clone()),
      ("customer_email".to_string(), request.customer_email.clone()),
      ("metadata[orderId]".to_string(), request.order_id.to_string()),
      ("metadata[userId]".to_string(), request.user_id.to_string()),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
      let prefix = format!("line_items[{i}]");
      params.push((format!("{prefix}[price_data][currency]"), request.currency.clone()));
      params.push((format!("{prefix}[price_data][product_data][name]"), item.name.clone()));
      params.push((format!("{prefix}[price_data][unit_amount]"), item.unit_amount.to_string()));
      params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }
    params
  }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  #[instrument(name = "StripeGateway::create_session", skip_all, fields(order_id = request.order_id))]
  async fn create_session(&self, request: &CheckoutSessionRequest) -> ShopResult<PaymentSession> {
    let endpoint = format!("{}/v1/checkout/sessions", self.api_base);
    let response = self
      .client
      .post(&endpoint)
      .bearer_auth(&self.secret_key)
      .form(&Self::form_params(request))
      .send()
      .await
      .map_err(|e| {
        error!(error = %e, timeout = e.is_timeout(), "Payment processor request failed.");
        ShopError::PaymentSessionCreationFailed(e.to_string())
      })?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      error!(%status, %body, "Payment processor rejected session request.");
      return Err(ShopError::PaymentSessionCreationFailed(format!(
        "processor responded with {status}"
      )));
    }

    let session: SessionResponse = response
      .json()
      .await
      .map_err(|e| ShopError::PaymentSessionCreationFailed(format!("unreadable session response: {e}")))?;
    let url = session
      .url
      .ok_or_else(|| ShopError::PaymentSessionCreationFailed("session has no redirect URL".to_string()))?;

    debug!(session_id = %session.id, "Payment session created.");
    Ok(PaymentSession { id: session.id, url })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::payment::SessionLineItem;

  #[test]
  fn form_params_flatten_line_items_and_metadata() {
    let request = CheckoutSessionRequest {
      order_id: 42,
      user_id: 7,
      customer_email: "buyer@example.com".to_string(),
      currency: "jpy".to_string(),
      line_items: vec![
        SessionLineItem { name: "Mug".to_string(), unit_amount: 1000, quantity: 2 },
        SessionLineItem { name: "Shipping".to_string(), unit_amount: 500, quantity: 1 },
      ],
      success_url: "https://shop/account?session_id={CHECKOUT_SESSION_ID}".to_string(),
      cancel_url: "https://shop/order-confirm".to_string(),
    };

    let params = StripeGateway::form_params(&request);
    let get = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

    assert_eq!(get("mode"), Some("payment"));
    assert_eq!(get("metadata[orderId]"), Some("42"));
    assert_eq!(get("metadata[userId]"), Some("7"));
    assert_eq!(get("line_items[0][price_data][product_data][name]"), Some("Mug"));
    assert_eq!(get("line_items[0][quantity]"), Some("2"));
    assert_eq!(get("line_items[1][price_data][unit_amount]"), Some("500"));
    assert_eq!(get("line_items[1][price_data][currency]"), Some("jpy"));
  }
}
