// server/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i64,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub is_admin: bool,
  #[serde(skip_serializing)]
  pub enabled: bool,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn principal(&self) -> storefront::Principal {
    storefront::Principal {
      user_id: self.id,
      name: self.name.clone(),
      email: self.email.clone(),
      is_admin: self.is_admin,
    }
  }
}
