// server/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A review joined with its author's display name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewView {
  pub id: i64,
  pub product_id: i64,
  pub user_id: i64,
  pub user_name: String,
  pub score: i32,
  pub content: String,
  pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn review_rows_serialize_snake_case() {
    let review = ReviewView {
      id: 1,
      product_id: 3,
      user_id: 7,
      user_name: "Hanako".to_string(),
      score: 4,
      content: "Keeps coffee warm.".to_string(),
      created_at: Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap(),
    };
    let value = serde_json::to_value(&review).unwrap();
    assert_eq!(value["user_name"], "Hanako");
    assert_eq!(value["product_id"], 3);
    assert_eq!(value["score"], 4);
    assert!(value.get("created_at").is_some());
  }
}
