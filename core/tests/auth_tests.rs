// tests/auth_tests.rs
mod common;

use common::setup_tracing;
use std::time::Duration;
use storefront::auth::{hash_password, verify_password};
use storefront::{Principal, ShopError, TokenIssuer};

fn alice(is_admin: bool) -> Principal {
  Principal {
    user_id: 11,
    name: "Alice".to_string(),
    email: "alice@example.com".to_string(),
    is_admin,
  }
}

fn issuer() -> TokenIssuer {
  TokenIssuer::new(b"test-signing-secret", Duration::from_secs(3600))
}

#[test]
fn issued_token_round_trips_to_principal() {
  setup_tracing();
  let token = issuer().issue(&alice(true)).unwrap();
  assert_eq!(issuer().verify(&token).unwrap(), alice(true));
}

#[test]
fn expired_tampered_and_foreign_tokens_are_unauthenticated() {
  setup_tracing();
  let issued_two_hours_ago = chrono::Utc::now().timestamp() - 7200;
  let expired = issuer().issue_at(&alice(false), issued_two_hours_ago).unwrap();
  assert!(matches!(issuer().verify(&expired), Err(ShopError::Unauthenticated)));

  let token = issuer().issue(&alice(false)).unwrap();
  let mut tampered = token.clone();
  tampered.push('x');
  assert!(matches!(issuer().verify(&tampered), Err(ShopError::Unauthenticated)));

  let foreign = TokenIssuer::new(b"someone-else", Duration::from_secs(3600));
  assert!(matches!(foreign.verify(&token), Err(ShopError::Unauthenticated)));

  assert!(matches!(issuer().verify("not-a-jwt"), Err(ShopError::Unauthenticated)));
}

#[test]
fn admin_check_distinguishes_forbidden() {
  assert!(alice(true).require_admin().is_ok());
  assert!(matches!(alice(false).require_admin(), Err(ShopError::Forbidden)));
}

#[test]
fn password_hash_verifies_only_the_original() {
  let hash = hash_password("correct horse").unwrap();
  assert!(verify_password(&hash, "correct horse").unwrap());
  assert!(!verify_password(&hash, "wrong horse").unwrap());
  assert!(hash_password("").is_err());
  assert!(verify_password("not-a-phc-string", "x").is_err());
}

#[test]
fn oversized_lifetime_fails_instead_of_wrapping() {
  setup_tracing();
  let unbounded = TokenIssuer::new(b"test-signing-secret", Duration::from_secs(u64::MAX));
  assert!(matches!(unbounded.issue_at(&alice(false), 0), Err(ShopError::Internal(_))));

  assert!(matches!(
    issuer().issue_at(&alice(false), i64::MAX - 10),
    Err(ShopError::Internal(_))
  ));
}
