// server/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: i64,
  pub name: String,
  pub description: String,
  pub price: i64,
  pub stock: i64,
  pub image_url: Option<String>,
  pub sales_count: i64,
  pub is_featured: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A product with its aggregated review score, as shown in listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductListing {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub product: Product,
  /// Mean score rounded to one decimal; 0 when unreviewed.
  pub review_avg: f64,
  pub review_count: i64,
}
