// core/src/models/product.rs

use serde::Serialize;
use sqlx::FromRow;

/// The slice of a product the checkout flow needs: identity, display name,
/// current unit price (minor currency units) and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CatalogEntry {
  pub id: i64,
  pub name: String,
  pub price: i64,
  pub stock: i64,
}
