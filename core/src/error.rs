// core/src/error.rs

use thiserror::Error;

/// Failures raised by the pipeline engine itself rather than by a handler.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("pipeline '{pipeline}': non-optional step '{step_name}' has no handler")]
  HandlerMissing { pipeline: String, step_name: String },
}

/// Coarse classification used by outer layers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// The caller sent something unusable.
  Validation,
  /// Missing or insufficient credentials.
  AuthZ,
  /// The request was well-formed but conflicts with current state.
  Conflict,
  /// Storage, payment processor, or engine failure. Details stay in the logs.
  Infra,
  /// Tampered or unverifiable input. Never processed.
  Security,
}

#[derive(Debug, Error)]
pub enum ShopError {
  #[error("Invalid cart: {0}")]
  InvalidCart(String),

  #[error("Shipping address is required")]
  InvalidAddress,

  #[error("Some cart products were not found: {ids:?}")]
  CartProductNotFound { ids: Vec<i64> },

  #[error("Out of stock products: {}", .names.join(", "))]
  InsufficientStock { names: Vec<String> },

  #[error("Failed to create payment session: {0}")]
  PaymentSessionCreationFailed(String),

  #[error("Database error: {0}")]
  Persistence(#[from] sqlx::Error),

  #[error("Webhook signature verification failed: {0}")]
  InvalidSignature(String),

  #[error("Malformed event: {0}")]
  MalformedEvent(String),

  #[error("Stock reconciliation failed for order {order_id} (product {product_id:?})")]
  StockReconciliationFailed { order_id: i64, product_id: Option<i64> },

  #[error("Authentication required")]
  Unauthenticated,

  #[error("Administrator privileges required")]
  Forbidden,

  #[error("{0}")]
  Validation(String),

  #[error("Pipeline error: {0}")]
  Pipeline(#[from] PipelineError),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl ShopError {
  pub fn class(&self) -> ErrorClass {
    match self {
      ShopError::InvalidCart(_)
      | ShopError::InvalidAddress
      | ShopError::CartProductNotFound { .. }
      | ShopError::MalformedEvent(_)
      | ShopError::Validation(_) => ErrorClass::Validation,
      ShopError::Unauthenticated | ShopError::Forbidden => ErrorClass::AuthZ,
      ShopError::InsufficientStock { .. } | ShopError::StockReconciliationFailed { .. } => ErrorClass::Conflict,
      ShopError::InvalidSignature(_) => ErrorClass::Security,
      ShopError::PaymentSessionCreationFailed(_)
      | ShopError::Persistence(_)
      | ShopError::Pipeline(_)
      | ShopError::Internal(_) => ErrorClass::Infra,
    }
  }
}

pub type ShopResult<T, E = ShopError> = std::result::Result<T, E>;
