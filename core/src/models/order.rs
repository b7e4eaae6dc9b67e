// core/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[sqlx(type_name = "payment_status_enum", rename_all = "lowercase")]
pub enum PaymentStatus {
  Unpaid,
  Paid,
  Refunded,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: i64,
  pub user_id: i64,
  pub total_price: i64,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub shipping_address: String,
  pub created_at: DateTime<Utc>,
}

/// A persisted line. `product_id` becomes `None` once the product is deleted;
/// name and unit price are snapshots taken at checkout.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub id: i64,
  pub order_id: i64,
  pub product_id: Option<i64>,
  pub product_name: String,
  pub quantity: i64,
  pub unit_price: i64,
}

/// An order with its lines, as listed to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
  pub product_id: i64,
  pub product_name: String,
  pub quantity: i64,
  pub unit_price: i64,
}

/// What checkout writes: always Pending/Unpaid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
  pub user_id: i64,
  pub total_price: i64,
  pub shipping_address: String,
  pub lines: Vec<NewOrderLine>,
}

/// Result of the settlement transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
  /// The order moved to Processing/Paid and stock was decremented.
  Settled,
  /// Nothing matched: already paid, or the order/user pair is unknown.
  AlreadySettled,
}
