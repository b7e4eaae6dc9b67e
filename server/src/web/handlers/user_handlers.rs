// server/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront::auth::{hash_password, verify_password};
use storefront::Principal;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::session::auth_cookie;
use crate::web::validation;

const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin, enabled, created_at";

#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
  pub name: String,
  pub email: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdateProfilePayload {
  pub name: String,
  pub email: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
  #[serde(alias = "currentPassword")]
  pub old_password: String,
  pub new_password: String,
}

async fn email_taken(app_state: &AppState, email: &str, except_user: Option<i64>) -> Result<bool, AppError> {
  let taken: bool = sqlx::query_scalar(
    "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
  )
  .bind(email)
  .bind(except_user)
  .fetch_one(&app_state.db_pool)
  .await?;
  Ok(taken)
}

async fn load_user(app_state: &AppState, user_id: i64) -> Result<User, AppError> {
  sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
    .bind(user_id)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[instrument(name = "handler::register", skip(app_state, payload))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse, AppError> {
  let name = validation::required("Name", &payload.name)?;
  let email = validation::email(&payload.email)?;
  validation::password(&payload.password)?;

  if email_taken(&app_state, &email, None).await? {
    return Err(AppError::Conflict("Email address is already registered".to_string()));
  }

  let password_hash = hash_password(&payload.password)?;
  let user_id: i64 =
    sqlx::query_scalar("INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING id")
      .bind(&name)
      .bind(&email)
      .bind(&password_hash)
      .fetch_one(&app_state.db_pool)
      .await?;

  info!(user_id, "User registered.");
  Ok(HttpResponse::Created().json(json!({ "message": "Registration complete.", "id": user_id })))
}

#[instrument(name = "handler::me", skip(app_state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let user = load_user(&app_state, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(user.principal()))
}

/// Updates name and email, then re-issues the session cookie so the token
/// claims match the new profile.
#[instrument(name = "handler::update_profile", skip(app_state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<UpdateProfilePayload>,
) -> Result<HttpResponse, AppError> {
  let name = validation::required("Name", &payload.name)?;
  let email = validation::email(&payload.email)?;

  if email_taken(&app_state, &email, Some(auth_user.user_id)).await? {
    return Err(AppError::Conflict("Email address is already registered".to_string()));
  }

  let updated = sqlx::query("UPDATE users SET name = $1, email = $2, updated_at = NOW() WHERE id = $3")
    .bind(&name)
    .bind(&email)
    .bind(auth_user.user_id)
    .execute(&app_state.db_pool)
    .await?
    .rows_affected();
  if updated == 0 {
    return Err(AppError::NotFound("User not found".to_string()));
  }

  let principal = Principal {
    user_id: auth_user.user_id,
    name,
    email,
    is_admin: auth_user.is_admin,
  };
  let token = app_state.tokens.issue(&principal)?;

  Ok(
    HttpResponse::Ok()
      .cookie(auth_cookie(&app_state.config, token))
      .json(json!({ "message": "Profile updated.", "user": principal })),
  )
}

#[instrument(name = "handler::change_password", skip(app_state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn change_password_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<ChangePasswordPayload>,
) -> Result<HttpResponse, AppError> {
  validation::password(&payload.new_password)?;

  let user = load_user(&app_state, auth_user.user_id).await?;
  if !verify_password(&user.password_hash, &payload.old_password)? {
    return Err(AppError::Validation("Current password is incorrect".to_string()));
  }

  let password_hash = hash_password(&payload.new_password)?;
  sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
    .bind(&password_hash)
    .bind(user.id)
    .execute(&app_state.db_pool)
    .await?;

  info!("Password changed.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Password changed." })))
}
