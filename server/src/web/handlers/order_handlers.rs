// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront::models::cart::resolve_lines;
use storefront::models::CartLine;
use storefront::store::OrderLedger;
use storefront::{CheckoutRequest, ErrorClass, SettlementOutcome};
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Deserialize, Debug)]
pub struct CheckoutPayload {
  #[serde(default)]
  pub items: Vec<CartLine>,
  #[serde(default, alias = "shippingAddress")]
  pub address: String,
}

#[instrument(name = "handler::checkout", skip(app_state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CheckoutPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let request = CheckoutRequest {
    user_id: auth_user.user_id,
    email: auth_user.email.clone(),
    items: resolve_lines(&payload.items)?,
    shipping_address: payload.address,
  };

  let receipt = app_state.checkout.checkout(request).await?;
  info!(order_id = receipt.order_id, "Redirecting buyer to payment page.");
  Ok(HttpResponse::Ok().json(json!({ "url": receipt.url })))
}

/// Processor callback. The body is read raw since the signature covers the exact bytes.
/// Only the status code matters to the processor: 400 tells it not to retry, 500 asks for redelivery.
#[instrument(name = "handler::payment_webhook", skip(app_state, req, body), fields(body_len = body.len()))]
pub async fn webhook_handler(app_state: web::Data<AppState>, req: HttpRequest, body: web::Bytes) -> HttpResponse {
  let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

  match app_state.settlement.reconcile(&body, signature).await {
    Ok(SettlementOutcome::Settled { order_id }) => {
      info!(order_id, "Payment settled.");
      HttpResponse::Ok().finish()
    }
    Ok(outcome) => {
      info!(?outcome, "Webhook acknowledged without changes.");
      HttpResponse::Ok().finish()
    }
    Err(e) => match e.class() {
      ErrorClass::Validation | ErrorClass::Security => {
        warn!(error = %e, "Rejecting webhook delivery.");
        HttpResponse::BadRequest().finish()
      }
      _ => {
        error!(error = %e, "Webhook processing failed; the processor will retry.");
        HttpResponse::InternalServerError().finish()
      }
    },
  }
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.store.orders_for_user(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}
