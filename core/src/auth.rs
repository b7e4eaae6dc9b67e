// core/src/auth.rs

//! Session tokens and password hashing.
//!
//! A successful login yields an HS256 JWT binding the user's id, display name,
//! email and admin flag. Every protected call turns that token back into a
//! [`Principal`]; anything that fails verification is `Unauthenticated`.

use crate::error::{ShopError, ShopResult};
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
/// Longest session a configuration may ask for.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// The verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
  pub user_id: i64,
  pub name: String,
  pub email: String,
  pub is_admin: bool,
}

impl Principal {
  pub fn require_admin(&self) -> ShopResult<()> {
    if self.is_admin {
      Ok(())
    } else {
      Err(ShopError::Forbidden)
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
  user_id: i64,
  name: String,
  email: String,
  is_admin: bool,
  iat: i64,
  exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl: Duration,
}

impl TokenIssuer {
  pub fn new(secret: &[u8], ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      ttl,
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  pub fn issue(&self, principal: &Principal) -> ShopResult<String> {
    self.issue_at(principal, Utc::now().timestamp())
  }

  /// Issues a token as if the current time were `issued_at` (unix seconds).
  pub fn issue_at(&self, principal: &Principal, issued_at: i64) -> ShopResult<String> {
    let claims = Claims {
      user_id: principal.user_id,
      name: principal.name.clone(),
      email: principal.email.clone(),
      is_admin: principal.is_admin,
      iat: issued_at,
      exp: expiry(issued_at, self.ttl)?,
    };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
      error!(error = %e, "Failed to sign session token.");
      ShopError::Internal(format!("token signing failed: {e}"))
    })
  }

  pub fn verify(&self, token: &str) -> ShopResult<Principal> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
      debug!(error = %e, "Session token rejected.");
      ShopError::Unauthenticated
    })?;
    let claims = data.claims;
    Ok(Principal {
      user_id: claims.user_id,
      name: claims.name,
      email: claims.email,
      is_admin: claims.is_admin,
    })
  }
}

fn expiry(issued_at: i64, ttl: Duration) -> ShopResult<i64> {
  i64::try_from(ttl.as_secs())
    .ok()
    .and_then(|ttl| issued_at.checked_add(ttl))
    .ok_or_else(|| ShopError::Internal(format!("token lifetime of {}s is out of range", ttl.as_secs())))
}

/// Hashes a plain-text password with Argon2 and a random salt.
#[instrument(name = "auth::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> ShopResult<String> {
  if password.is_empty() {
    return Err(ShopError::Validation("Password cannot be empty.".to_string()));
  }
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ShopError::Internal(format!("password hashing failed: {e}")))
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
#[instrument(name = "auth::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided: &str) -> ShopResult<bool> {
  let parsed = PasswordHash::new(stored_hash)
    .map_err(|e| ShopError::Internal(format!("invalid stored password hash: {e}")))?;
  match Argon2::default().verify_password(provided.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(e) => Err(ShopError::Internal(format!("password verification failed: {e}"))),
  }
}
