// storefront/src/models/session.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Customer,
  Admin,
}

impl Role {
  pub fn from_db(raw: &str) -> Self {
    if raw.eq_ignore_ascii_case("admin") {
      Role::Admin
    } else {
      Role::Customer
    }
  }
}

/// A session issued by the sign-in service and resolved here by token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
  pub user_id: String,
  pub email: String,
  pub role: Role,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at <= now
  }
}
