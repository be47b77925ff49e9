// storefront/src/db/mod.rs

//! Persistence seams. Each store is a trait object in `AppState`, backed by
//! Postgres in production and by `parking_lot`-guarded maps in tests and
//! database-less development runs.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{CatalogEntry, Order, OrderItem, OrderItemView, OrderStatus, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::{InMemoryIdempotencyStore, InMemoryOrderStore, InMemorySessionStore};
pub use postgres::{PgIdempotencyStore, PgOrderStore, PgSessionStore};

/// A webhook-driven status change, applied only if the order still has
/// `expected_status` when the write happens.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
  pub order_id: String,
  pub expected_status: OrderStatus,
  pub new_status: OrderStatus,
  pub payment_status: String,
  /// `Some` only when the update completes the order.
  pub paid_at: Option<DateTime<Utc>>,
  pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Persists an order together with its items, all or nothing.
  async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<()>;

  async fn find_order(&self, order_id: &str) -> Result<Option<Order>>;

  async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>>;

  async fn find_by_legacy_payment_id(&self, payment_id: &str) -> Result<Option<Order>>;

  async fn list_items(&self, order_id: &str) -> Result<Vec<OrderItem>>;

  /// Items joined with current product and variation display names.
  async fn list_item_views(&self, order_id: &str) -> Result<Vec<OrderItemView>>;

  /// Orders owned by `user_id` or placed with `email`, newest first, each once.
  async fn list_for_customer(&self, user_id: &str, email: &str) -> Result<Vec<Order>>;

  /// Newest first, optionally filtered by status.
  async fn list_recent(&self, status: Option<&OrderStatus>, limit: i64) -> Result<Vec<Order>>;

  /// Single conditional write; returns `false` when the order's status no
  /// longer matches `expected_status` (or the order vanished).
  async fn apply_payment_update(&self, update: &PaymentUpdate) -> Result<bool>;

  /// Administrative status override. Returns the updated order.
  async fn override_status(&self, order_id: &str, status: &OrderStatus, now: DateTime<Utc>) -> Result<Option<Order>>;

  async fn catalog_entry(&self, product_id: &str, variation_id: Option<&str>) -> Result<Option<CatalogEntry>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
  /// Returns the session for `token` if it exists and has not expired.
  async fn find(&self, token: &str) -> Result<Option<Session>>;
}

/// Webhook event deduplication.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
  /// Atomically records `event_id`. `true` means this caller is the first to
  /// see it (within the retention window) and should process the event.
  async fn claim(&self, event_id: &str) -> Result<bool>;

  /// Forgets `event_id` so a redelivery is processed again.
  async fn release(&self, event_id: &str) -> Result<()>;
}

/// `paid_at` after an administrative override to `status`.
pub(crate) fn paid_at_after_override(
  status: &OrderStatus,
  current: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
  match status {
    OrderStatus::Completed => current.or(Some(now)),
    OrderStatus::Refunded => current,
    _ => None,
  }
}
