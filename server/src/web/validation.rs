// server/src/web/validation.rs

use crate::errors::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[a-zA-Z0-9.]+@[a-zA-Z0-9.]+$").expect("email pattern must compile")
});

/// Trims `value`, rejecting it if nothing is left.
pub fn required(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(AppError::Validation(format!("{field} is required")));
  }
  Ok(trimmed.to_string())
}

pub fn email(value: &str) -> Result<String> {
  let value = required("Email address", value)?;
  if !EMAIL_PATTERN.is_match(&value) {
    return Err(AppError::Validation("Email address format is invalid".to_string()));
  }
  Ok(value)
}

pub fn password(value: &str) -> Result<()> {
  if value.chars().count() < MIN_PASSWORD_LEN {
    return Err(AppError::Validation(format!(
      "Password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_pattern() {
    assert_eq!(email(" taro.yamada@example.co.jp ").unwrap(), "taro.yamada@example.co.jp");
    assert!(email("no-at-sign").is_err());
    assert!(email("a@b c").is_err());
    assert!(email("   ").is_err());
  }

  #[test]
  fn password_length() {
    assert!(password("1234567").is_err());
    assert!(password("12345678").is_ok());
  }
}
