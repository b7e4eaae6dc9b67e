// core/src/checkout.rs

//! Turns a cart into a pending order plus an external payment session.
//!
//! The run is a step pipeline over [`CheckoutCtx`]. The order transaction is
//! opened in `open_order`, kept open across the payment call, and committed
//! only once the processor has handed back a session. Any failure after the
//! transaction opened rolls it back, so a failed checkout leaves no order.

use crate::error::{ShopError, ShopResult};
use crate::models::cart::merge_lines;
use crate::models::{CartItem, CatalogEntry, NewOrder, NewOrderLine};
use crate::payment::{CheckoutSessionRequest, PaymentGateway, PaymentSession, SessionLineItem};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
use crate::store::{CatalogStore, OrderLedger, PendingOrderTx};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const SHIPPING_LINE_NAME: &str = "Shipping";

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
  /// Flat surcharge added to every order, in minor currency units.
  pub shipping_cost: i64,
  pub currency: String,
  /// Where the processor sends the buyer back to.
  pub frontend_base_url: String,
  pub payment_timeout: Duration,
}

impl Default for CheckoutSettings {
  fn default() -> Self {
    Self {
      shipping_cost: 500,
      currency: "jpy".to_string(),
      frontend_base_url: "http://localhost:3000".to_string(),
      payment_timeout: Duration::from_secs(10),
    }
  }
}

impl CheckoutSettings {
  fn success_url(&self) -> String {
    format!(
      "{}/account?session_id={{CHECKOUT_SESSION_ID}}",
      self.frontend_base_url.trim_end_matches('/')
    )
  }

  fn cancel_url(&self) -> String {
    format!("{}/order-confirm", self.frontend_base_url.trim_end_matches('/'))
  }
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
  pub user_id: i64,
  pub email: String,
  pub items: Vec<CartItem>,
  pub shipping_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
  pub order_id: i64,
  pub session_id: String,
  pub total_price: i64,
  /// Redirect target on the processor's hosted page.
  pub url: String,
}

/// State of one checkout run.
pub struct CheckoutCtx {
  pub request: CheckoutRequest,
  pub lines: Vec<CartItem>,
  pub catalog: HashMap<i64, CatalogEntry>,
  pub total_price: i64,
  pub order_id: Option<i64>,
  pub session: Option<PaymentSession>,
  tx: Mutex<Option<Box<dyn PendingOrderTx>>>,
}

impl CheckoutCtx {
  pub fn new(request: CheckoutRequest) -> Self {
    Self {
      request,
      lines: Vec::new(),
      catalog: HashMap::new(),
      total_price: 0,
      order_id: None,
      session: None,
      tx: Mutex::new(None),
    }
  }

  fn take_tx(&self) -> Option<Box<dyn PendingOrderTx>> {
    self.tx.lock().take()
  }
}

pub struct CheckoutOrchestrator {
  pipeline: Pipeline<CheckoutCtx, ShopError>,
}

impl CheckoutOrchestrator {
  pub fn new(
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn OrderLedger>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
  ) -> Self {
    let settings = Arc::new(settings);
    let mut p = Pipeline::<CheckoutCtx, ShopError>::new(
      "checkout",
      &[
        ("validate_cart", false),
        ("resolve_products", false),
        ("check_stock", false),
        ("price_order", false),
        ("open_order", false),
        ("create_payment_session", false),
        ("commit_order", false),
      ],
    );

    p.on_root("validate_cart", |ctx: ContextData<CheckoutCtx>| {
      Box::pin(async move {
        let mut guard = ctx.write();
        if guard.request.items.is_empty() {
          return Err(ShopError::InvalidCart("cart is empty".to_string()));
        }
        if let Some(bad) = guard.request.items.iter().find(|i| i.quantity <= 0) {
          return Err(ShopError::InvalidCart(format!(
            "quantity for product {} must be positive",
            bad.product_id
          )));
        }
        if guard.request.shipping_address.trim().is_empty() {
          return Err(ShopError::InvalidAddress);
        }
        guard.lines = merge_lines(&guard.request.items);
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    let catalog_for_resolve = catalog.clone();
    p.on_root("resolve_products", move |ctx: ContextData<CheckoutCtx>| {
      let catalog = catalog_for_resolve.clone();
      Box::pin(async move {
        let ids: Vec<i64> = ctx.read().lines.iter().map(|l| l.product_id).collect();

        let found = catalog.lookup_by_ids(&ids).await?;
        let missing: Vec<i64> = ids.iter().copied().filter(|id| !found.contains_key(id)).collect();
        if !missing.is_empty() {
          warn!(?missing, "Cart references unknown products.");
          return Err(ShopError::CartProductNotFound { ids: missing });
        }

        ctx.write().catalog = found;
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    p.on_root("check_stock", |ctx: ContextData<CheckoutCtx>| {
      Box::pin(async move {
        let guard = ctx.read();
        let short: Vec<String> = guard
          .lines
          .iter()
          .filter_map(|line| {
            let entry = guard.catalog.get(&line.product_id)?;
            (entry.stock < line.quantity).then(|| entry.name.clone())
          })
          .collect();
        if !short.is_empty() {
          return Err(ShopError::InsufficientStock { names: short });
        }
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    let settings_for_price = settings.clone();
    p.on_root("price_order", move |ctx: ContextData<CheckoutCtx>| {
      let shipping = settings_for_price.shipping_cost;
      Box::pin(async move {
        let mut guard = ctx.write();
        let mut total = shipping;
        for line in &guard.lines {
          let entry = guard
            .catalog
            .get(&line.product_id)
            .ok_or(ShopError::CartProductNotFound { ids: vec![line.product_id] })?;
          total = entry
            .price
            .checked_mul(line.quantity)
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| ShopError::InvalidCart("order total overflows".to_string()))?;
        }
        guard.total_price = total;
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    let ledger_for_open = ledger.clone();
    p.on_root("open_order", move |ctx: ContextData<CheckoutCtx>| {
      let ledger = ledger_for_open.clone();
      Box::pin(async move {
        let new_order = {
          let guard = ctx.read();
          NewOrder {
            user_id: guard.request.user_id,
            total_price: guard.total_price,
            shipping_address: guard.request.shipping_address.trim().to_string(),
            lines: guard
              .lines
              .iter()
              .filter_map(|line| {
                guard.catalog.get(&line.product_id).map(|entry| NewOrderLine {
                  product_id: entry.id,
                  product_name: entry.name.clone(),
                  quantity: line.quantity,
                  unit_price: entry.price,
                })
              })
              .collect(),
          }
        };

        let mut tx = ledger.begin_order().await?;
        match tx.insert_order(&new_order).await {
          Ok(order_id) => {
            let mut guard = ctx.write();
            guard.order_id = Some(order_id);
            *guard.tx.lock() = Some(tx);
            Ok::<_, ShopError>(PipelineControl::Continue)
          }
          Err(e) => {
            if let Err(rb) = tx.rollback().await {
              warn!(error = %rb, "Rollback after failed insert also failed.");
            }
            Err(e)
          }
        }
      })
    });

    let settings_for_session = settings.clone();
    p.on_root("create_payment_session", move |ctx: ContextData<CheckoutCtx>| {
      let gateway = gateway.clone();
      let settings = settings_for_session.clone();
      Box::pin(async move {
        let request = {
          let guard = ctx.read();
          let order_id = guard
            .order_id
            .ok_or_else(|| ShopError::Internal("payment session requested before order was opened".to_string()))?;
          let mut line_items: Vec<SessionLineItem> = guard
            .lines
            .iter()
            .filter_map(|line| {
              guard.catalog.get(&line.product_id).map(|entry| SessionLineItem {
                name: entry.name.clone(),
                unit_amount: entry.price,
                quantity: line.quantity,
              })
            })
            .collect();
          if settings.shipping_cost > 0 {
            line_items.push(SessionLineItem {
              name: SHIPPING_LINE_NAME.to_string(),
              unit_amount: settings.shipping_cost,
              quantity: 1,
            });
          }
          CheckoutSessionRequest {
            order_id,
            user_id: guard.request.user_id,
            customer_email: guard.request.email.clone(),
            currency: settings.currency.clone(),
            line_items,
            success_url: settings.success_url(),
            cancel_url: settings.cancel_url(),
          }
        };

        let session = tokio::time::timeout(settings.payment_timeout, gateway.create_session(&request))
          .await
          .map_err(|_| ShopError::PaymentSessionCreationFailed("payment processor timed out".to_string()))??;

        ctx.write().session = Some(session);
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    p.on_root("commit_order", |ctx: ContextData<CheckoutCtx>| {
      Box::pin(async move {
        let (tx, order_id, session_id) = {
          let guard = ctx.read();
          (
            guard.take_tx(),
            guard.order_id,
            guard.session.as_ref().map(|s| s.id.clone()),
          )
        };
        let mut tx = tx.ok_or_else(|| ShopError::Internal("no open order transaction to commit".to_string()))?;

        if let Err(e) = tx.commit().await {
          // The processor already holds a session for an order that now does not exist.
          error!(?order_id, ?session_id, error = %e, "Order commit failed after payment session was created.");
          return Err(e);
        }
        Ok::<_, ShopError>(PipelineControl::Continue)
      })
    });

    Self { pipeline: p }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.pipeline.step_names().collect()
  }

  #[instrument(
    name = "CheckoutOrchestrator::checkout",
    skip_all,
    fields(user_id = request.user_id, items = request.items.len())
  )]
  pub async fn checkout(&self, request: CheckoutRequest) -> ShopResult<CheckoutReceipt> {
    let ctx = ContextData::new(CheckoutCtx::new(request));

    let outcome = self.pipeline.run(ctx.clone()).await;

    let leftover = ctx.read().take_tx();
    if let Some(mut tx) = leftover {
      if let Err(e) = tx.rollback().await {
        warn!(error = %e, "Rolling back abandoned order transaction failed.");
      }
    }

    match outcome? {
      PipelineResult::Completed => {
        let guard = ctx.read();
        match (guard.order_id, guard.session.as_ref()) {
          (Some(order_id), Some(session)) => {
            info!(order_id, session_id = %session.id, total = guard.total_price, "Checkout opened.");
            Ok(CheckoutReceipt {
              order_id,
              session_id: session.id.clone(),
              total_price: guard.total_price,
              url: session.url.clone(),
            })
          }
          _ => Err(ShopError::Internal("checkout completed without an order or session".to_string())),
        }
      }
      PipelineResult::Stopped => Err(ShopError::Internal("checkout pipeline stopped unexpectedly".to_string())),
    }
  }
}
