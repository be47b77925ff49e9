// storefront/src/models/order.rs

use crate::models::status::OrderStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A checkout transaction. Money is stored as NUMERIC and rendered as JSON numbers.
///
/// `paid_at` is set when the order first reaches `completed`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: String,
  pub email: String,
  /// Orders can be placed before the buyer has a session.
  pub user_id: Option<String>,
  #[serde(with = "rust_decimal::serde::float")]
  pub subtotal: Decimal,
  #[serde(with = "rust_decimal::serde::float")]
  pub discount_amount: Decimal,
  #[serde(with = "rust_decimal::serde::float")]
  pub total: Decimal,
  pub currency: String,
  #[sqlx(try_from = "String")]
  pub status: OrderStatus,
  /// Provider tag, e.g. `stripe` or `mock`.
  pub payment_provider: Option<String>,
  /// Provider payment-intent reference, matched by webhooks.
  pub payment_intent_id: Option<String>,
  /// Reference from the previous payment integration; read-only lookups only.
  pub legacy_payment_id: Option<String>,
  /// Raw provider status string from the last applied webhook.
  pub payment_status: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub paid_at: Option<DateTime<Utc>>,
}

/// Opaque identifier with a readable prefix, e.g. `ord_3f2a…`.
pub fn new_id(prefix: &str) -> String {
  format!("{}_{}", prefix, Uuid::new_v4().simple())
}
