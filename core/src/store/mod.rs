// core/src/store/mod.rs

//! Storage seams for the checkout and settlement flows.
//!
//! [`CatalogStore`] resolves products for a cart, [`OrderLedger`] owns order
//! records. `postgres` is the production implementation; `memory` backs tests
//! and embedders that do not want a database.

pub mod memory;
pub mod postgres;

use crate::error::ShopResult;
use crate::models::{CatalogEntry, NewOrder, Order, OrderLine, OrderSummary, Settlement};
use async_trait::async_trait;
use std::collections::HashMap;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// Batch lookup. Ids absent from the catalog are simply absent from the map.
  async fn lookup_by_ids(&self, ids: &[i64]) -> ShopResult<HashMap<i64, CatalogEntry>>;
}

/// An open order-writing transaction. Dropping it without `commit` discards
/// everything inserted through it.
#[async_trait]
pub trait PendingOrderTx: Send {
  /// Inserts the order (Pending/Unpaid) and all its lines, returning the new order id.
  async fn insert_order(&mut self, order: &NewOrder) -> ShopResult<i64>;

  async fn commit(&mut self) -> ShopResult<()>;

  async fn rollback(&mut self) -> ShopResult<()>;
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
  async fn begin_order(&self) -> ShopResult<Box<dyn PendingOrderTx>>;

  /// Atomically marks the order Processing/Paid and decrements stock for each
  /// line, guarded so that a second call for the same order is a no-op.
  ///
  /// Fails with `StockReconciliationFailed` (and changes nothing) when any
  /// line's product no longer has enough stock or no longer exists.
  async fn settle(&self, order_id: i64, user_id: i64) -> ShopResult<Settlement>;

  /// Orders owned by `user_id`, newest first, each with its lines.
  async fn orders_for_user(&self, user_id: i64) -> ShopResult<Vec<OrderSummary>>;

  async fn find_order(&self, order_id: i64) -> ShopResult<Option<Order>>;

  async fn order_lines(&self, order_id: i64) -> ShopResult<Vec<OrderLine>>;
}
