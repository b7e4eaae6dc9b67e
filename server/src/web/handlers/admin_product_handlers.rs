// server/src/web/handlers/admin_product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::Product;
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use crate::web::validation;

pub const DEFAULT_DESCRIPTION: &str = "No product description available.";

const RETURNING: &str =
  "RETURNING id, name, description, price, stock, image_url, sales_count, is_featured, created_at, updated_at";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
  pub name: String,
  pub description: Option<String>,
  pub price: i64,
  pub stock: i64,
  pub image_url: Option<String>,
  pub is_featured: Option<bool>,
}

/// A payload that passed validation, with defaults filled in.
#[derive(Debug, PartialEq)]
struct ProductFields {
  name: String,
  description: String,
  price: i64,
  stock: i64,
  image_url: Option<String>,
  is_featured: bool,
}

impl ProductPayload {
  fn validate(&self) -> Result<ProductFields, AppError> {
    let name = validation::required("Product name", &self.name)?;
    if self.price < 0 {
      return Err(AppError::Validation("Price must be an integer of 0 or greater".to_string()));
    }
    if self.stock < 0 {
      return Err(AppError::Validation("Stock must be an integer of 0 or greater".to_string()));
    }
    let description = self
      .description
      .as_deref()
      .map(str::trim)
      .filter(|d| !d.is_empty())
      .unwrap_or(DEFAULT_DESCRIPTION)
      .to_string();
    let image_url = self
      .image_url
      .as_deref()
      .map(str::trim)
      .filter(|u| !u.is_empty())
      .map(str::to_string);

    Ok(ProductFields {
      name,
      description,
      price: self.price,
      stock: self.stock,
      image_url,
      is_featured: self.is_featured.unwrap_or(false),
    })
  }
}

#[instrument(name = "handler::admin_create_product", skip(app_state, admin, payload), fields(admin_id = admin.user_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: web::Json<ProductPayload>,
) -> Result<HttpResponse, AppError> {
  let fields = payload.validate()?;

  let product: Product = sqlx::query_as(&format!(
    "INSERT INTO products (name, description, price, stock, image_url, is_featured) \
     VALUES ($1, $2, $3, $4, $5, $6) {RETURNING}"
  ))
  .bind(&fields.name)
  .bind(&fields.description)
  .bind(fields.price)
  .bind(fields.stock)
  .bind(&fields.image_url)
  .bind(fields.is_featured)
  .fetch_one(&app_state.db_pool)
  .await?;

  info!(product_id = product.id, "Product created.");
  Ok(HttpResponse::Created().json(json!({ "message": "Product registered successfully", "product": product })))
}

#[instrument(
  name = "handler::admin_update_product",
  skip(app_state, admin, path, payload),
  fields(admin_id = admin.user_id, product_id = %path.as_ref())
)]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
  payload: web::Json<ProductPayload>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let fields = payload.validate()?;

  let product: Option<Product> = sqlx::query_as(&format!(
    "UPDATE products SET name = $1, description = $2, price = $3, stock = $4, image_url = $5, \
     is_featured = $6, updated_at = NOW() WHERE id = $7 {RETURNING}"
  ))
  .bind(&fields.name)
  .bind(&fields.description)
  .bind(fields.price)
  .bind(fields.stock)
  .bind(&fields.image_url)
  .bind(fields.is_featured)
  .bind(product_id)
  .fetch_optional(&app_state.db_pool)
  .await?;

  let product = product.ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", product_id)))?;
  info!("Product updated.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Product updated successfully", "product": product })))
}

/// Past order lines keep their name and price snapshot; their product link is cleared.
#[instrument(
  name = "handler::admin_delete_product",
  skip(app_state, admin, path),
  fields(admin_id = admin.user_id, product_id = %path.as_ref())
)]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
    .bind(product_id)
    .execute(&app_state.db_pool)
    .await?
    .rows_affected();

  if deleted == 0 {
    return Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)));
  }
  info!("Product deleted.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted successfully" })))
}
