// server/src/web/extractors.rs

//! Request extractors that turn the session token into a typed principal.

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::AUTH_COOKIE;
use actix_web::{http::header, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use std::ops::Deref;
use storefront::{Principal, ShopError};
use tracing::debug;

/// Any signed-in user. Rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

/// A signed-in administrator. Rejects with 401 without a session and 403 for
/// non-admin sessions.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

impl Deref for AuthenticatedUser {
  type Target = Principal;
  fn deref(&self) -> &Principal {
    &self.0
  }
}

impl Deref for AdminUser {
  type Target = Principal;
  fn deref(&self) -> &Principal {
    &self.0
  }
}

/// The cookie wins over an `Authorization: Bearer` header when both are present.
fn session_token(req: &HttpRequest) -> Option<String> {
  if let Some(cookie) = req.cookie(AUTH_COOKIE) {
    return Some(cookie.value().to_string());
  }
  req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(|t| t.trim().to_string())
}

fn authenticate(req: &HttpRequest) -> Result<Principal, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("application state is not registered".to_string()))?;
  let token = session_token(req).ok_or_else(|| {
    debug!(path = %req.path(), "No session token on request.");
    AppError::Shop(ShopError::Unauthenticated)
  })?;
  Ok(state.tokens.verify(&token)?)
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    ready(authenticate(req).map(AuthenticatedUser))
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let result = authenticate(req).and_then(|principal| {
      principal.require_admin()?;
      Ok(AdminUser(principal))
    });
    ready(result)
  }
}
