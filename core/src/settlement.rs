// core/src/settlement.rs

//! Applies verified payment confirmations to the order ledger.
//!
//! Every delivery is verified before anything is decoded. Only
//! `checkout.session.completed` events reach the ledger; the ledger's
//! conditional transition makes redelivery of the same event a no-op.

use crate::error::{ShopError, ShopResult};
use crate::models::Settlement;
use crate::payment::{PaymentEvent, SignatureVerifier, CHECKOUT_SESSION_COMPLETED};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
use crate::store::OrderLedger;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
  Settled { order_id: i64 },
  /// Redelivery, or an order/user pair that matches nothing.
  AlreadySettled { order_id: i64 },
  /// An event kind settlement does not act on.
  Ignored { event_type: String },
}

pub struct SettlementCtx {
  pub payload: Vec<u8>,
  pub signature_header: Option<String>,
  pub received_at: i64,
  pub event: Option<PaymentEvent>,
  pub order_id: Option<i64>,
  pub user_id: Option<i64>,
  pub settlement: Option<Settlement>,
}

pub struct SettlementReconciler {
  pipeline: Pipeline<SettlementCtx, ShopError>,
}

impl SettlementReconciler {
  pub fn new(ledger: Arc<dyn OrderLedger>, verifier: SignatureVerifier) -> Self {
    let verifier = Arc::new(verifier);
    let mut p = Pipeline::<SettlementCtx, ShopError>::new(
      "settlement",
      &[
        ("verify_signature", false),
        ("parse_event", false),
        ("route_event", false),
        ("extract_metadata", false),
        ("settle_order", false),
      ],
    );

    p.on_root("verify_signature", move |ctx: ContextData<SettlementCtx>| {
      let verifier = verifier.clone();
      Box::pin(async move {
        let guard = ctx.read();
        let header = guard
          .signature_header
          .as_deref()
          .ok_or_else(|| ShopError::InvalidSignature("missing signature header".to_string()))?;
        verifier.verify(&guard.payload, header, guard.received_at).map_err(|e| {
          warn!(error = %e, "Rejected webhook delivery.");
          e
        })?;
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    p.on_root("parse_event", |ctx: ContextData<SettlementCtx>| {
      Box::pin(async move {
        let mut guard = ctx.write();
        let event = PaymentEvent::parse(&guard.payload)?;
        info!(event_id = %event.id, event_type = %event.event_type, "Webhook event received.");
        guard.event = Some(event);
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    p.on_root("route_event", |ctx: ContextData<SettlementCtx>| {
      Box::pin(async move {
        let guard = ctx.read();
        match guard.event.as_ref() {
          Some(event) if event.event_type == CHECKOUT_SESSION_COMPLETED => Ok(PipelineControl::Continue),
          Some(event) => {
            info!(event_type = %event.event_type, "Unhandled event type; acknowledging.");
            Ok(PipelineControl::Stop)
          }
          None => Err(ShopError::MalformedEvent("event was not decoded".to_string())),
        }
      })
    });

    p.on_root("extract_metadata", |ctx: ContextData<SettlementCtx>| {
      Box::pin(async move {
        let mut guard = ctx.write();
        let (order_id, user_id) = {
          let event = guard
            .event
            .as_ref()
            .ok_or_else(|| ShopError::MalformedEvent("event was not decoded".to_string()))?;
          (event.metadata_id("orderId")?, event.metadata_id("userId")?)
        };
        guard.order_id = Some(order_id);
        guard.user_id = Some(user_id);
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    p.on_root("settle_order", move |ctx: ContextData<SettlementCtx>| {
      let ledger = ledger.clone();
      Box::pin(async move {
        let ids = {
          let guard = ctx.read();
          guard.order_id.zip(guard.user_id)
        };
        let (order_id, user_id) =
          ids.ok_or_else(|| ShopError::MalformedEvent("order metadata was not extracted".to_string()))?;

        let settlement = ledger.settle(order_id, user_id).await?;
        ctx.write().settlement = Some(settlement);
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    Self { pipeline: p }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.pipeline.step_names().collect()
  }

  pub async fn reconcile(&self, payload: &[u8], signature_header: Option<&str>) -> ShopResult<SettlementOutcome> {
    self.reconcile_at(payload, signature_header, Utc::now().timestamp()).await
  }

  /// Same as [`SettlementReconciler::reconcile`] with an explicit receive time
  /// (unix seconds) for the signature freshness check.
  #[instrument(name = "SettlementReconciler::reconcile", skip_all, fields(payload_len = payload.len()))]
  pub async fn reconcile_at(
    &self,
    payload: &[u8],
    signature_header: Option<&str>,
    received_at: i64,
  ) -> ShopResult<SettlementOutcome> {
    let ctx = ContextData::new(SettlementCtx {
      payload: payload.to_vec(),
      signature_header: signature_header.map(str::to_string),
      received_at,
      event: None,
      order_id: None,
      user_id: None,
      settlement: None,
    });

    let result = self.pipeline.run(ctx.clone()).await?;
    let guard = ctx.read();
    match result {
      PipelineResult::Stopped => Ok(SettlementOutcome::Ignored {
        event_type: guard.event.as_ref().map(|e| e.event_type.clone()).unwrap_or_default(),
      }),
      PipelineResult::Completed => match (guard.settlement, guard.order_id) {
        (Some(Settlement::Settled), Some(order_id)) => Ok(SettlementOutcome::Settled { order_id }),
        (Some(Settlement::AlreadySettled), Some(order_id)) => Ok(SettlementOutcome::AlreadySettled { order_id }),
        _ => Err(ShopError::Internal("settlement completed without a result".to_string())),
      },
    }
  }
}
