// core/src/store/postgres.rs

use super::{CatalogStore, OrderLedger, PendingOrderTx};
use crate::error::{ShopError, ShopResult};
use crate::models::{CatalogEntry, NewOrder, Order, OrderLine, OrderStatus, OrderSummary, PaymentStatus, Settlement};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

const ORDER_COLUMNS: &str = "id, user_id, total_price, status, payment_status, shipping_address, created_at";
const LINE_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, unit_price";

/// PostgreSQL-backed catalog and ledger sharing one connection pool.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  #[instrument(name = "PgStore::lookup_by_ids", skip(self), fields(count = ids.len()))]
  async fn lookup_by_ids(&self, ids: &[i64]) -> ShopResult<HashMap<i64, CatalogEntry>> {
    let rows: Vec<CatalogEntry> = sqlx::query_as("SELECT id, name, price, stock FROM products WHERE id = ANY($1)")
      .bind(ids)
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().map(|entry| (entry.id, entry)).collect())
  }
}

/// Wraps a live transaction. `None` once committed or rolled back.
pub struct PgOrderTx {
  tx: Option<Transaction<'static, Postgres>>,
}

impl PgOrderTx {
  fn live(&mut self) -> ShopResult<&mut Transaction<'static, Postgres>> {
    self
      .tx
      .as_mut()
      .ok_or_else(|| ShopError::Internal("order transaction already finished".to_string()))
  }
}

#[async_trait]
impl PendingOrderTx for PgOrderTx {
  #[instrument(name = "PgOrderTx::insert_order", skip_all, fields(user_id = order.user_id, lines = order.lines.len()))]
  async fn insert_order(&mut self, order: &NewOrder) -> ShopResult<i64> {
    let tx = self.live()?;

    let order_id: i64 = sqlx::query_scalar(
      "INSERT INTO orders (user_id, total_price, status, payment_status, shipping_address) \
       VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(order.user_id)
    .bind(order.total_price)
    .bind(OrderStatus::Pending)
    .bind(PaymentStatus::Unpaid)
    .bind(&order.shipping_address)
    .fetch_one(&mut **tx)
    .await?;

    for line in &order.lines {
      sqlx::query(
        "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price) \
         VALUES ($1, $2, $3, $4, $5)",
      )
      .bind(order_id)
      .bind(line.product_id)
      .bind(&line.product_name)
      .bind(line.quantity)
      .bind(line.unit_price)
      .execute(&mut **tx)
      .await?;
    }

    debug!(order_id, "Pending order inserted.");
    Ok(order_id)
  }

  async fn commit(&mut self) -> ShopResult<()> {
    match self.tx.take() {
      Some(tx) => Ok(tx.commit().await?),
      None => Err(ShopError::Internal("order transaction already finished".to_string())),
    }
  }

  async fn rollback(&mut self) -> ShopResult<()> {
    if let Some(tx) = self.tx.take() {
      tx.rollback().await?;
    }
    Ok(())
  }
}

#[async_trait]
impl OrderLedger for PgStore {
  async fn begin_order(&self) -> ShopResult<Box<dyn PendingOrderTx>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgOrderTx { tx: Some(tx) }))
  }

  #[instrument(name = "PgStore::settle", skip(self))]
  async fn settle(&self, order_id: i64, user_id: i64) -> ShopResult<Settlement> {
    let mut tx = self.pool.begin().await?;

    let transitioned = sqlx::query(
      "UPDATE orders SET status = $1, payment_status = $2, updated_at = NOW() \
       WHERE id = $3 AND user_id = $4 AND payment_status <> $2",
    )
    .bind(OrderStatus::Processing)
    .bind(PaymentStatus::Paid)
    .bind(order_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if transitioned == 0 {
      info!("Order already settled or not owned by user; nothing to do.");
      tx.rollback().await?;
      return Ok(Settlement::AlreadySettled);
    }

    let lines: Vec<(Option<i64>, i64)> =
      sqlx::query_as("SELECT product_id, quantity FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

    for (product_id, quantity) in lines {
      let Some(pid) = product_id else {
        warn!("Order line references a deleted product.");
        return Err(ShopError::StockReconciliationFailed { order_id, product_id: None });
      };

      let decremented = sqlx::query(
        "UPDATE products SET stock = stock - $1, sales_count = sales_count + $1, updated_at = NOW() \
         WHERE id = $2 AND stock >= $1",
      )
      .bind(quantity)
      .bind(pid)
      .execute(&mut *tx)
      .await?
      .rows_affected();

      // Dropping `tx` on the error path rolls back the status change and any
      // decrements already applied.
      if decremented == 0 {
        warn!(product_id = pid, quantity, "Insufficient stock at settlement.");
        return Err(ShopError::StockReconciliationFailed {
          order_id,
          product_id: Some(pid),
        });
      }
    }

    tx.commit().await?;
    info!("Order settled.");
    Ok(Settlement::Settled)
  }

  #[instrument(name = "PgStore::orders_for_user", skip(self))]
  async fn orders_for_user(&self, user_id: i64) -> ShopResult<Vec<OrderSummary>> {
    let orders: Vec<Order> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;

    if orders.is_empty() {
      return Ok(Vec::new());
    }

    let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let lines: Vec<OrderLine> = sqlx::query_as(&format!(
      "SELECT {LINE_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
    ))
    .bind(&order_ids)
    .fetch_all(&self.pool)
    .await?;

    let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for line in lines {
      by_order.entry(line.order_id).or_default().push(line);
    }

    Ok(
      orders
        .into_iter()
        .map(|order| {
          let items = by_order.remove(&order.id).unwrap_or_default();
          OrderSummary { order, items }
        })
        .collect(),
    )
  }

  async fn find_order(&self, order_id: i64) -> ShopResult<Option<Order>> {
    let order = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  async fn order_lines(&self, order_id: i64) -> ShopResult<Vec<OrderLine>> {
    let lines = sqlx::query_as(&format!(
      "SELECT {LINE_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(lines)
  }
}
