// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use storefront::auth::MAX_TOKEN_TTL;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub db_max_connections: u32,

  pub jwt_secret: String,
  pub token_ttl: Duration,
  /// `Domain` attribute of the auth cookie, if any.
  pub cookie_domain: Option<String>,
  /// Production deployments only send the auth cookie over HTTPS.
  pub secure_cookies: bool,

  pub stripe_secret_key: String,
  pub stripe_webhook_secret: String,
  pub stripe_api_base: String,
  pub payment_timeout: Duration,
  pub webhook_tolerance: Duration,

  pub frontend_base_url: String,
  pub currency: String,
  pub shipping_cost: i64,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let parse_env = |var_name: &str, default: &str| -> Result<u64> {
      get_env(var_name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let db_max_connections = max_connections(parse_env("DB_MAX_CONNECTIONS", "10")?)?;

    let jwt_secret = get_env("JWT_SECRET")?;
    if jwt_secret.len() < 16 {
      return Err(AppError::Config("JWT_SECRET must be at least 16 bytes".to_string()));
    }
    let token_ttl = token_ttl(parse_env("TOKEN_TTL_SECS", "3600")?)?;
    let cookie_domain = get_env("COOKIE_DOMAIN").ok().filter(|d| !d.trim().is_empty());
    let secure_cookies = get_env("APP_ENV").map(|v| v == "production").unwrap_or(false);

    let stripe_secret_key = get_env("STRIPE_SECRET_KEY").unwrap_or_default();
    let stripe_webhook_secret = get_env("STRIPE_WEBHOOK_SECRET").unwrap_or_default();
    if stripe_secret_key.is_empty() || stripe_webhook_secret.is_empty() {
      tracing::warn!("Stripe credentials are not fully configured; checkout and webhooks will fail.");
    }
    let stripe_api_base =
      get_env("STRIPE_API_BASE").unwrap_or_else(|_| storefront::payment::stripe::DEFAULT_API_BASE.to_string());
    let payment_timeout = Duration::from_secs(parse_env("PAYMENT_TIMEOUT_SECS", "10")?);
    let webhook_tolerance = Duration::from_secs(parse_env("WEBHOOK_TOLERANCE_SECS", "300")?);

    let frontend_base_url = get_env("FRONTEND_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let currency = get_env("CURRENCY").unwrap_or_else(|_| "jpy".to_string()).to_lowercase();
    let shipping_cost = get_env("SHIPPING_COST")
      .unwrap_or_else(|_| "500".to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid SHIPPING_COST: {}", e)))?;
    if shipping_cost < 0 {
      return Err(AppError::Config("SHIPPING_COST cannot be negative".to_string()));
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      jwt_secret,
      token_ttl,
      cookie_domain,
      secure_cookies,
      stripe_secret_key,
      stripe_webhook_secret,
      stripe_api_base,
      payment_timeout,
      webhook_tolerance,
      frontend_base_url,
      currency,
      shipping_cost,
    })
  }

  pub fn checkout_settings(&self) -> storefront::CheckoutSettings {
    storefront::CheckoutSettings {
      shipping_cost: self.shipping_cost,
      currency: self.currency.clone(),
      frontend_base_url: self.frontend_base_url.clone(),
      payment_timeout: self.payment_timeout,
    }
  }
}

fn max_connections(value: u64) -> Result<u32> {
  match u32::try_from(value) {
    Ok(n) if n > 0 => Ok(n),
    _ => Err(AppError::Config(format!(
      "DB_MAX_CONNECTIONS must be between 1 and {}",
      u32::MAX
    ))),
  }
}

fn token_ttl(secs: u64) -> Result<Duration> {
  let ttl = Duration::from_secs(secs);
  if secs == 0 || ttl > MAX_TOKEN_TTL {
    return Err(AppError::Config(format!(
      "TOKEN_TTL_SECS must be between 1 and {}",
      MAX_TOKEN_TTL.as_secs()
    )));
  }
  Ok(ttl)
}
