// storefront/src/db/memory.rs

use super::{paid_at_after_override, IdempotencyStore, OrderStore, PaymentUpdate, SessionStore};
use crate::errors::{AppError, Result};
use crate::models::{CatalogEntry, Order, OrderItem, OrderItemView, OrderStatus, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
struct OrderTables {
  orders: HashMap<String, Order>,
  items: Vec<OrderItem>,
  products: HashMap<String, (String, Decimal)>,
  variations: HashMap<String, (String, String, Decimal)>, // id -> (product_id, name, price)
}

/// Order store for tests and database-less runs.
#[derive(Default)]
pub struct InMemoryOrderStore {
  tables: RwLock<OrderTables>,
  updates_applied: Mutex<usize>,
  fail_next_update: AtomicBool,
  // Written just before the next payment update, as a concurrent writer would.
  interleaved_write: Mutex<Option<(String, OrderStatus)>>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_product(&self, product_id: &str, name: &str, price: Decimal) {
    self
      .tables
      .write()
      .products
      .insert(product_id.to_string(), (name.to_string(), price));
  }

  pub fn add_variation(&self, product_id: &str, variation_id: &str, name: &str, price: Decimal) {
    self.tables.write().variations.insert(
      variation_id.to_string(),
      (product_id.to_string(), name.to_string(), price),
    );
  }

  /// Number of successful webhook status writes, for asserting exactly-once effects.
  pub fn payment_updates_applied(&self) -> usize {
    *self.updates_applied.lock()
  }

  /// Makes the next `apply_payment_update` fail with a database error.
  pub fn fail_next_payment_update(&self) {
    self.fail_next_update.store(true, Ordering::SeqCst);
  }

  /// Moves `order_id` to `status` right before the next `apply_payment_update`
  /// runs, simulating a write that lands between a webhook's read and its update.
  pub fn change_status_before_next_update(&self, order_id: &str, status: OrderStatus) {
    *self.interleaved_write.lock() = Some((order_id.to_string(), status));
  }

  fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    orders
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<()> {
    let mut tables = self.tables.write();
    tables.orders.insert(order.id.clone(), order.clone());
    tables.items.extend(items.iter().cloned());
    Ok(())
  }

  async fn find_order(&self, order_id: &str) -> Result<Option<Order>> {
    Ok(self.tables.read().orders.get(order_id).cloned())
  }

  async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>> {
    let tables = self.tables.read();
    Ok(
      tables
        .orders
        .values()
        .find(|o| o.payment_intent_id.as_deref() == Some(payment_intent_id))
        .cloned(),
    )
  }

  async fn find_by_legacy_payment_id(&self, payment_id: &str) -> Result<Option<Order>> {
    let tables = self.tables.read();
    Ok(
      tables
        .orders
        .values()
        .find(|o| o.legacy_payment_id.as_deref() == Some(payment_id))
        .cloned(),
    )
  }

  async fn list_items(&self, order_id: &str) -> Result<Vec<OrderItem>> {
    let tables = self.tables.read();
    Ok(tables.items.iter().filter(|i| i.order_id == order_id).cloned().collect())
  }

  async fn list_item_views(&self, order_id: &str) -> Result<Vec<OrderItemView>> {
    let tables = self.tables.read();
    Ok(
      tables
        .items
        .iter()
        .filter(|i| i.order_id == order_id)
        .map(|item| OrderItemView {
          product_name: tables.products.get(&item.product_id).map(|(name, _)| name.clone()),
          variation_name: item
            .variation_id
            .as_ref()
            .and_then(|v| tables.variations.get(v))
            .map(|(_, name, _)| name.clone()),
          item: item.clone(),
        })
        .collect(),
    )
  }

  async fn list_for_customer(&self, user_id: &str, email: &str) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    let matching = tables
      .orders
      .values()
      .filter(|o| o.user_id.as_deref() == Some(user_id) || o.email == email)
      .cloned()
      .collect();
    Ok(Self::newest_first(matching))
  }

  async fn list_recent(&self, status: Option<&OrderStatus>, limit: i64) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    let matching = tables
      .orders
      .values()
      .filter(|o| status.map_or(true, |s| &o.status == s))
      .cloned()
      .collect();
    Ok(Self::newest_first(matching).into_iter().take(limit.max(0) as usize).collect())
  }

  async fn apply_payment_update(&self, update: &PaymentUpdate) -> Result<bool> {
    if self.fail_next_update.swap(false, Ordering::SeqCst) {
      return Err(AppError::Sqlx(sqlx::Error::PoolTimedOut));
    }
    let mut tables = self.tables.write();
    if let Some((order_id, status)) = self.interleaved_write.lock().take() {
      if let Some(order) = tables.orders.get_mut(&order_id) {
        order.status = status;
      }
    }
    let Some(order) = tables.orders.get_mut(&update.order_id) else {
      return Ok(false);
    };
    if order.status != update.expected_status {
      return Ok(false);
    }
    order.status = update.new_status.clone();
    order.payment_status = Some(update.payment_status.clone());
    order.updated_at = update.updated_at;
    if update.paid_at.is_some() {
      order.paid_at = update.paid_at;
    }
    *self.updates_applied.lock() += 1;
    Ok(true)
  }

  async fn override_status(&self, order_id: &str, status: &OrderStatus, now: DateTime<Utc>) -> Result<Option<Order>> {
    let mut tables = self.tables.write();
    let Some(order) = tables.orders.get_mut(order_id) else {
      return Ok(None);
    };
    order.paid_at = paid_at_after_override(status, order.paid_at, now);
    order.status = status.clone();
    order.updated_at = now;
    Ok(Some(order.clone()))
  }

  async fn catalog_entry(&self, product_id: &str, variation_id: Option<&str>) -> Result<Option<CatalogEntry>> {
    let tables = self.tables.read();
    let Some((product_name, product_price)) = tables.products.get(product_id) else {
      return Ok(None);
    };
    match variation_id {
      None => Ok(Some(CatalogEntry {
        product_id: product_id.to_string(),
        variation_id: None,
        name: product_name.clone(),
        unit_price: *product_price,
      })),
      Some(variation_id) => Ok(
        tables
          .variations
          .get(variation_id)
          .filter(|(owner, _, _)| owner == product_id)
          .map(|(_, variation_name, price)| CatalogEntry {
            product_id: product_id.to_string(),
            variation_id: Some(variation_id.to_string()),
            name: format!("{} - {}", product_name, variation_name),
            unit_price: *price,
          }),
      ),
    }
  }
}

#[derive(Default)]
pub struct InMemorySessionStore {
  sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, token: &str, session: Session) {
    self.sessions.write().insert(token.to_string(), session);
  }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
  async fn find(&self, token: &str) -> Result<Option<Session>> {
    let now = Utc::now();
    Ok(self.sessions.read().get(token).filter(|s| !s.is_expired(now)).cloned())
  }
}

/// Process-local dedup set with expiry. Only correct for a single running
/// instance; state is lost on restart.
pub struct InMemoryIdempotencyStore {
  ttl: Duration,
  seen: Mutex<HashMap<String, Instant>>,
}

impl InMemoryIdempotencyStore {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      seen: Mutex::new(HashMap::new()),
    }
  }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
  async fn claim(&self, event_id: &str) -> Result<bool> {
    let now = Instant::now();
    let mut seen = self.seen.lock();
    seen.retain(|_, at| now.duration_since(*at) < self.ttl);
    if seen.contains_key(event_id) {
      return Ok(false);
    }
    seen.insert(event_id.to_string(), now);
    Ok(true)
  }

  async fn release(&self, event_id: &str) -> Result<()> {
    self.seen.lock().remove(event_id);
    Ok(())
  }
}
