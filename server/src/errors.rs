// server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront::{ErrorClass, ShopError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error(transparent)]
  Shop(#[from] ShopError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// The message shown to the caller. Infrastructure details stay in the logs.
  fn public_message(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::Auth(m) | AppError::NotFound(m) | AppError::Conflict(m) => m.clone(),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
      AppError::Shop(e) => match e.class() {
        ErrorClass::Infra => match e {
          ShopError::PaymentSessionCreationFailed(_) => "Failed to create payment session".to_string(),
          _ => "An internal error occurred".to_string(),
        },
        ErrorClass::Security => "Invalid signature".to_string(),
        _ => e.to_string(),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Shop(e) => match e.class() {
        ErrorClass::Validation | ErrorClass::Security => StatusCode::BAD_REQUEST,
        ErrorClass::AuthZ => match e {
          ShopError::Forbidden => StatusCode::FORBIDDEN,
          _ => StatusCode::UNAUTHORIZED,
        },
        ErrorClass::Conflict => StatusCode::CONFLICT,
        ErrorClass::Infra => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, %status, "Rejecting request");
    }
    HttpResponse::build(status).json(json!({ "error": self.public_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
