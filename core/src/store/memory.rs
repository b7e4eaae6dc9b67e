// core/src/store/memory.rs

use super::{CatalogStore, OrderLedger, PendingOrderTx};
use crate::error::{ShopError, ShopResult};
use crate::models::{
  CatalogEntry, NewOrder, Order, OrderLine, OrderStatus, OrderSummary, PaymentStatus, Settlement,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct StockedProduct {
  entry: CatalogEntry,
  sales_count: i64,
}

#[derive(Debug, Default)]
struct Tables {
  products: HashMap<i64, StockedProduct>,
  orders: BTreeMap<i64, Order>,
  lines: Vec<OrderLine>,
  next_order_id: i64,
  next_line_id: i64,
}

impl Tables {
  fn allocate_order_id(&mut self) -> i64 {
    self.next_order_id += 1;
    self.next_order_id
  }

  fn allocate_line_id(&mut self) -> i64 {
    self.next_line_id += 1;
    self.next_line_id
  }
}

/// Catalog and ledger held in process memory with the same all-or-nothing
/// semantics as the PostgreSQL store.
#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_products(products: impl IntoIterator<Item = CatalogEntry>) -> Self {
    let store = Self::new();
    for entry in products {
      store.upsert_product(entry);
    }
    store
  }

  pub fn upsert_product(&self, entry: CatalogEntry) {
    let mut tables = self.tables.lock();
    let sales_count = tables.products.get(&entry.id).map_or(0, |p| p.sales_count);
    tables.products.insert(entry.id, StockedProduct { entry, sales_count });
  }

  pub fn remove_product(&self, product_id: i64) {
    let mut tables = self.tables.lock();
    tables.products.remove(&product_id);
    for line in tables.lines.iter_mut().filter(|l| l.product_id == Some(product_id)) {
      line.product_id = None;
    }
  }

  pub fn set_stock(&self, product_id: i64, stock: i64) {
    if let Some(product) = self.tables.lock().products.get_mut(&product_id) {
      product.entry.stock = stock;
    }
  }

  pub fn stock_of(&self, product_id: i64) -> Option<i64> {
    self.tables.lock().products.get(&product_id).map(|p| p.entry.stock)
  }

  pub fn sales_of(&self, product_id: i64) -> Option<i64> {
    self.tables.lock().products.get(&product_id).map(|p| p.sales_count)
  }

  pub fn order_count(&self) -> usize {
    self.tables.lock().orders.len()
  }

  pub fn line_count(&self) -> usize {
    self.tables.lock().lines.len()
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn lookup_by_ids(&self, ids: &[i64]) -> ShopResult<HashMap<i64, CatalogEntry>> {
    let tables = self.tables.lock();
    Ok(
      ids
        .iter()
        .filter_map(|id| tables.products.get(id).map(|p| (*id, p.entry.clone())))
        .collect(),
    )
  }
}

/// Stages one order and publishes it to the tables only on commit.
pub struct MemoryOrderTx {
  tables: Arc<Mutex<Tables>>,
  staged: Option<(Order, Vec<OrderLine>)>,
  finished: bool,
}

#[async_trait]
impl PendingOrderTx for MemoryOrderTx {
  async fn insert_order(&mut self, order: &NewOrder) -> ShopResult<i64> {
    if self.finished {
      return Err(ShopError::Internal("order transaction already finished".to_string()));
    }

    let mut tables = self.tables.lock();
    let order_id = tables.allocate_order_id();
    let lines = order
      .lines
      .iter()
      .map(|line| OrderLine {
        id: tables.allocate_line_id(),
        order_id,
        product_id: Some(line.product_id),
        product_name: line.product_name.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
      })
      .collect();

    let record = Order {
      id: order_id,
      user_id: order.user_id,
      total_price: order.total_price,
      status: OrderStatus::Pending,
      payment_status: PaymentStatus::Unpaid,
      shipping_address: order.shipping_address.clone(),
      created_at: Utc::now(),
    };
    self.staged = Some((record, lines));
    Ok(order_id)
  }

  async fn commit(&mut self) -> ShopResult<()> {
    if self.finished {
      return Err(ShopError::Internal("order transaction already finished".to_string()));
    }
    self.finished = true;
    if let Some((order, lines)) = self.staged.take() {
      let mut tables = self.tables.lock();
      tables.orders.insert(order.id, order);
      tables.lines.extend(lines);
    }
    Ok(())
  }

  async fn rollback(&mut self) -> ShopResult<()> {
    self.finished = true;
    self.staged = None;
    Ok(())
  }
}

#[async_trait]
impl OrderLedger for MemoryStore {
  async fn begin_order(&self) -> ShopResult<Box<dyn PendingOrderTx>> {
    Ok(Box::new(MemoryOrderTx {
      tables: Arc::clone(&self.tables),
      staged: None,
      finished: false,
    }))
  }

  async fn settle(&self, order_id: i64, user_id: i64) -> ShopResult<Settlement> {
    let mut tables = self.tables.lock();

    let eligible = tables
      .orders
      .get(&order_id)
      .is_some_and(|o| o.user_id == user_id && o.payment_status != PaymentStatus::Paid);
    if !eligible {
      return Ok(Settlement::AlreadySettled);
    }

    // Apply every decrement to a scratch copy first so a failing line leaves
    // the real tables untouched.
    let mut scratch: HashMap<i64, StockedProduct> = HashMap::new();
    let lines: Vec<(Option<i64>, i64)> = tables
      .lines
      .iter()
      .filter(|l| l.order_id == order_id)
      .map(|l| (l.product_id, l.quantity))
      .collect();

    for (product_id, quantity) in lines {
      let Some(pid) = product_id else {
        return Err(ShopError::StockReconciliationFailed { order_id, product_id: None });
      };
      let current = match scratch.get(&pid) {
        Some(p) => p.clone(),
        None => match tables.products.get(&pid) {
          Some(p) => p.clone(),
          None => return Err(ShopError::StockReconciliationFailed { order_id, product_id: Some(pid) }),
        },
      };
      if current.entry.stock < quantity {
        return Err(ShopError::StockReconciliationFailed { order_id, product_id: Some(pid) });
      }
      let mut next = current;
      next.entry.stock -= quantity;
      next.sales_count += quantity;
      scratch.insert(pid, next);
    }

    tables.products.extend(scratch);
    if let Some(order) = tables.orders.get_mut(&order_id) {
      order.status = OrderStatus::Processing;
      order.payment_status = PaymentStatus::Paid;
    }
    Ok(Settlement::Settled)
  }

  async fn orders_for_user(&self, user_id: i64) -> ShopResult<Vec<OrderSummary>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .orders
        .values()
        .rev()
        .filter(|o| o.user_id == user_id)
        .map(|order| OrderSummary {
          order: order.clone(),
          items: tables.lines.iter().filter(|l| l.order_id == order.id).cloned().collect(),
        })
        .collect(),
    )
  }

  async fn find_order(&self, order_id: i64) -> ShopResult<Option<Order>> {
    Ok(self.tables.lock().orders.get(&order_id).cloned())
  }

  async fn order_lines(&self, order_id: i64) -> ShopResult<Vec<OrderLine>> {
    Ok(
      self
        .tables
        .lock()
        .lines
        .iter()
        .filter(|l| l.order_id == order_id)
        .cloned()
        .collect(),
    )
  }
}
