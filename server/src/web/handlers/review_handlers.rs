// server/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::ReviewView;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::pagination::{PageQuery, PageWindow, Pagination, REVIEWS_PER_PAGE};
use crate::web::validation;

#[derive(Deserialize, Debug)]
pub struct ReviewPayload {
  /// Star rating, stored as the review's score.
  #[serde(alias = "score")]
  pub rating: i32,
  pub content: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewStats {
  total: i64,
  average: f64,
}

pub(crate) async fn ensure_product_exists(app_state: &AppState, product_id: i64) -> Result<(), AppError> {
  let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
    .bind(product_id)
    .fetch_one(&app_state.db_pool)
    .await?;
  if exists {
    Ok(())
  } else {
    Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
  }
}

#[instrument(name = "handler::list_reviews", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn list_reviews_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let window = PageWindow::resolve(
    PageQuery {
      page: query.page,
      per_page: None,
    },
    REVIEWS_PER_PAGE,
  );

  let reviews = sqlx::query_as::<_, ReviewView>(
    "SELECT r.id, r.product_id, r.user_id, u.name AS user_name, r.score, r.content, r.created_at \
     FROM reviews r JOIN users u ON u.id = r.user_id \
     WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3",
  )
  .bind(product_id)
  .bind(window.per_page)
  .bind(window.offset())
  .fetch_all(&app_state.db_pool);
  let stats = sqlx::query_as::<_, ReviewStats>(
    "SELECT COUNT(*) AS total, COALESCE(ROUND(AVG(score)::numeric, 1), 0)::FLOAT8 AS average \
     FROM reviews WHERE product_id = $1",
  )
  .bind(product_id)
  .fetch_one(&app_state.db_pool);

  let (reviews, stats) = tokio::try_join!(reviews, stats)?;

  Ok(HttpResponse::Ok().json(json!({
    "reviews": reviews,
    "review_avg": stats.average,
    "pagination": Pagination::new(window, stats.total),
  })))
}

#[instrument(
  name = "handler::create_review",
  skip(app_state, auth_user, path, payload),
  fields(user_id = auth_user.user_id, product_id = %path.as_ref())
)]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<ReviewPayload>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  if !(1..=5).contains(&payload.rating) {
    return Err(AppError::Validation("Rating must be between 1 and 5".to_string()));
  }
  let content = validation::required("Review content", &payload.content)?;
  ensure_product_exists(&app_state, product_id).await?;

  let review: ReviewView = sqlx::query_as(
    "WITH inserted AS ( \
       INSERT INTO reviews (product_id, user_id, score, content) VALUES ($1, $2, $3, $4) \
       RETURNING id, product_id, user_id, score, content, created_at \
     ) \
     SELECT i.id, i.product_id, i.user_id, u.name AS user_name, i.score, i.content, i.created_at \
     FROM inserted i JOIN users u ON u.id = i.user_id",
  )
  .bind(product_id)
  .bind(auth_user.user_id)
  .bind(payload.rating)
  .bind(&content)
  .fetch_one(&app_state.db_pool)
  .await?;

  info!(review_id = review.id, "Review posted.");
  Ok(HttpResponse::Created().json(json!({ "message": "Review posted successfully", "review": review })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn review_form_posts_rating() {
    let payload: ReviewPayload = serde_json::from_str(r#"{"rating":4,"content":"Lovely glaze"}"#).unwrap();
    assert_eq!(payload.rating, 4);
    assert_eq!(payload.content, "Lovely glaze");
  }
}
