// server/src/web/handlers/favorite_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::product_handlers::PRODUCT_COLUMNS;
use super::review_handlers::ensure_product_exists;
use crate::errors::AppError;
use crate::models::Product;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FavoritePayload {
  pub product_id: i64,
}

#[instrument(name = "handler::list_favorites", skip(app_state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_favorites_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let products: Vec<Product> = sqlx::query_as(&format!(
    "SELECT {PRODUCT_COLUMNS} FROM favorites f JOIN products p ON p.id = f.product_id \
     WHERE f.user_id = $1 ORDER BY f.created_at DESC"
  ))
  .bind(auth_user.user_id)
  .fetch_all(&app_state.db_pool)
  .await?;

  Ok(HttpResponse::Ok().json(products))
}

/// Adding an existing favorite is not an error.
#[instrument(name = "handler::add_favorite", skip(app_state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn add_favorite_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<FavoritePayload>,
) -> Result<HttpResponse, AppError> {
  ensure_product_exists(&app_state, payload.product_id).await?;

  let inserted = sqlx::query(
    "INSERT INTO favorites (user_id, product_id) VALUES ($1, $2) ON CONFLICT (user_id, product_id) DO NOTHING",
  )
  .bind(auth_user.user_id)
  .bind(payload.product_id)
  .execute(&app_state.db_pool)
  .await?
  .rows_affected();

  info!(product_id = payload.product_id, inserted, "Favorite added.");
  let response = if inserted > 0 {
    HttpResponse::Created()
  } else {
    HttpResponse::Ok()
  }
  .json(json!({ "message": "Product added to favorites", "isFavorite": true }));
  Ok(response)
}

#[instrument(name = "handler::favorite_status", skip(app_state, auth_user, path), fields(user_id = auth_user.user_id))]
pub async fn favorite_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let is_favorite: bool =
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND product_id = $2)")
      .bind(auth_user.user_id)
      .bind(path.into_inner())
      .fetch_one(&app_state.db_pool)
      .await?;

  Ok(HttpResponse::Ok().json(json!({ "isFavorite": is_favorite })))
}

#[instrument(name = "handler::remove_favorite", skip(app_state, auth_user, path), fields(user_id = auth_user.user_id))]
pub async fn remove_favorite_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
    .bind(auth_user.user_id)
    .bind(product_id)
    .execute(&app_state.db_pool)
    .await?
    .rows_affected();

  if removed == 0 {
    return Err(AppError::NotFound("Favorite not found".to_string()));
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Removed from favorites", "isFavorite": false })))
}
