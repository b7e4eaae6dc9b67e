// server/src/web/handlers/auth_handlers.rs

use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront::auth::verify_password;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;
use crate::web::session::{auth_cookie, cleared_auth_cookie};

const LOGIN_FAILED: &str = "Incorrect email address or password";
const LOGGED_OUT_REDIRECT: &str = "/?logged-out=1";

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  pub email: String,
  pub password: String,
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let user: Option<User> = sqlx::query_as(
    "SELECT id, name, email, password_hash, is_admin, enabled, created_at FROM users WHERE email = $1 AND enabled = TRUE",
  )
  .bind(payload.email.trim())
  .fetch_optional(&app_state.db_pool)
  .await?;

  let Some(user) = user else {
    warn!("Login attempt for unknown or disabled account.");
    return Err(AppError::Auth(LOGIN_FAILED.to_string()));
  };
  if !verify_password(&user.password_hash, &payload.password)? {
    warn!(user_id = user.id, "Login attempt with wrong password.");
    return Err(AppError::Auth(LOGIN_FAILED.to_string()));
  }

  let principal = user.principal();
  let token = app_state.tokens.issue(&principal)?;
  info!(user_id = user.id, "User logged in.");

  Ok(
    HttpResponse::Ok()
      .cookie(auth_cookie(&app_state.config, token))
      .json(json!({ "message": "Login successful", "isAdmin": principal.is_admin, "user": principal })),
  )
}

#[instrument(name = "handler::logout", skip(app_state))]
pub async fn logout_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Found()
    .insert_header((header::LOCATION, LOGGED_OUT_REDIRECT))
    .cookie(cleared_auth_cookie(&app_state.config))
    .finish()
}
