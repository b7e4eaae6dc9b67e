// server/src/web/handlers/inquiry_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::Inquiry;
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use crate::web::validation;

#[derive(Deserialize, Debug)]
pub struct InquiryPayload {
  pub name: String,
  pub email: String,
  pub message: String,
}

#[instrument(name = "handler::create_inquiry", skip(app_state, payload))]
pub async fn create_inquiry_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<InquiryPayload>,
) -> Result<HttpResponse, AppError> {
  let name = validation::required("Name", &payload.name)?;
  let email = validation::email(&payload.email)?;
  let message = validation::required("Message", &payload.message)?;

  let inquiry: Inquiry = sqlx::query_as(
    "INSERT INTO inquiries (name, email, message) VALUES ($1, $2, $3) \
     RETURNING id, name, email, message, created_at",
  )
  .bind(&name)
  .bind(&email)
  .bind(&message)
  .fetch_one(&app_state.db_pool)
  .await?;

  info!(inquiry_id = inquiry.id, "Inquiry received.");
  Ok(HttpResponse::Created().json(json!({ "message": "Inquiry received", "id": inquiry.id })))
}

#[instrument(name = "handler::list_inquiries", skip(app_state, admin), fields(admin_id = admin.user_id))]
pub async fn list_inquiries_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let inquiries: Vec<Inquiry> = sqlx::query_as(
    "SELECT id, name, email, message, created_at FROM inquiries ORDER BY created_at DESC, id DESC",
  )
  .fetch_all(&app_state.db_pool)
  .await?;

  Ok(HttpResponse::Ok().json(inquiries))
}
