// server/src/web/session.rs

//! The `authToken` cookie carrying the session JWT.

use crate::config::AppConfig;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};

pub const AUTH_COOKIE: &str = "authToken";

pub fn auth_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
  let mut builder = Cookie::build(AUTH_COOKIE, token)
    .path("/")
    .http_only(true)
    .secure(config.secure_cookies)
    .same_site(SameSite::Lax)
    .max_age(CookieDuration::seconds(config.token_ttl.as_secs() as i64));
  if let Some(domain) = &config.cookie_domain {
    builder = builder.domain(domain.clone());
  }
  builder.finish()
}

/// An expired `authToken` cookie with the same scope, which makes the browser drop it.
pub fn cleared_auth_cookie(config: &AppConfig) -> Cookie<'static> {
  let mut cookie = auth_cookie(config, String::new());
  cookie.make_removal();
  cookie
}
