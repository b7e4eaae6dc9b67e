// core/src/models/cart.rs

use crate::error::{ShopError, ShopResult};
use serde::Deserialize;

pub const INVALID_PRODUCT_ID: &str = "Invalid product ID in cart";

/// A validated cart line: a catalog id and the requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem {
  pub product_id: i64,
  pub quantity: i64,
}

/// A product id as the storefront client sends it. The browser cart keeps ids
/// as strings; numeric ids are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
  Id(i64),
  Text(String),
}

impl ProductRef {
  pub fn resolve(&self) -> ShopResult<i64> {
    match self {
      ProductRef::Id(id) => Ok(*id),
      ProductRef::Text(text) => text
        .trim()
        .parse()
        .map_err(|_| ShopError::Validation(INVALID_PRODUCT_ID.to_string())),
    }
  }
}

/// One cart line as posted by the client. Title, price and image travel with
/// it for display only; prices are never trusted, so they are not read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartLine {
  #[serde(alias = "productId")]
  pub id: ProductRef,
  pub quantity: i64,
}

impl TryFrom<&CartLine> for CartItem {
  type Error = ShopError;

  fn try_from(line: &CartLine) -> ShopResult<Self> {
    Ok(CartItem {
      product_id: line.id.resolve()?,
      quantity: line.quantity,
    })
  }
}

/// Converts a posted cart, failing on the first unusable id.
pub fn resolve_lines(lines: &[CartLine]) -> ShopResult<Vec<CartItem>> {
  lines.iter().map(CartItem::try_from).collect()
}

/// Folds repeated product ids into a single line by summing quantities,
/// keeping the order in which each id first appeared.
pub fn merge_lines(items: &[CartItem]) -> Vec<CartItem> {
  let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());
  for item in items {
    match merged.iter_mut().find(|m| m.product_id == item.product_id) {
      Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
      None => merged.push(*item),
    }
  }
  merged
}
