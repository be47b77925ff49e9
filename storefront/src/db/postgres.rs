// storefront/src/db/postgres.rs

use super::{paid_at_after_override, IdempotencyStore, OrderStore, PaymentUpdate, SessionStore};
use crate::errors::{AppError, Result};
use crate::models::{CatalogEntry, Order, OrderItem, OrderItemView, OrderStatus, Role, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use tracing::{debug, error, instrument};

const ORDER_COLUMNS: &str = "id, email, user_id, subtotal, discount_amount, total, currency, status, \
   payment_provider, payment_intent_id, legacy_payment_id, payment_status, created_at, updated_at, paid_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, variation_id, name, unit_price, quantity, line_total";

#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE {} = $1", ORDER_COLUMNS, column);
    sqlx::query_as::<_, Order>(&sql)
      .bind(value)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| {
        error!(%column, %value, "Database error while fetching order: {}", e);
        AppError::Sqlx(e)
      })
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "PgOrderStore::insert_order", skip_all, fields(order_id = %order.id, items = items.len()), err(Display))]
  async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<()> {
    let mut tx = self.pool.begin().await?;

    sqlx::query(
      "INSERT INTO orders (id, email, user_id, subtotal, discount_amount, total, currency, status, \
       payment_provider, payment_intent_id, legacy_payment_id, payment_status, created_at, updated_at, paid_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(&order.id)
    .bind(&order.email)
    .bind(&order.user_id)
    .bind(order.subtotal)
    .bind(order.discount_amount)
    .bind(order.total)
    .bind(&order.currency)
    .bind(order.status.as_str())
    .bind(&order.payment_provider)
    .bind(&order.payment_intent_id)
    .bind(&order.legacy_payment_id)
    .bind(&order.payment_status)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.paid_at)
    .execute(&mut *tx)
    .await?;

    for item in items {
      sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, variation_id, name, unit_price, quantity, line_total) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
      )
      .bind(&item.id)
      .bind(&item.order_id)
      .bind(&item.product_id)
      .bind(&item.variation_id)
      .bind(&item.name)
      .bind(item.unit_price)
      .bind(item.quantity)
      .bind(item.line_total)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    debug!("Order and items committed.");
    Ok(())
  }

  async fn find_order(&self, order_id: &str) -> Result<Option<Order>> {
    self.fetch_one_by("id", order_id).await
  }

  async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>> {
    self.fetch_one_by("payment_intent_id", payment_intent_id).await
  }

  async fn find_by_legacy_payment_id(&self, payment_id: &str) -> Result<Option<Order>> {
    self.fetch_one_by("legacy_payment_id", payment_id).await
  }

  async fn list_items(&self, order_id: &str) -> Result<Vec<OrderItem>> {
    let sql = format!("SELECT {} FROM order_items WHERE order_id = $1 ORDER BY id", ITEM_COLUMNS);
    Ok(
      sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn list_item_views(&self, order_id: &str) -> Result<Vec<OrderItemView>> {
    Ok(
      sqlx::query_as::<_, OrderItemView>(
        "SELECT i.id, i.order_id, i.product_id, i.variation_id, i.name, i.unit_price, i.quantity, i.line_total, \
                p.name AS product_name, v.name AS variation_name \
         FROM order_items i \
         LEFT JOIN products p ON p.id = i.product_id \
         LEFT JOIN product_variations v ON v.id = i.variation_id \
         WHERE i.order_id = $1 \
         ORDER BY i.id",
      )
      .bind(order_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn list_for_customer(&self, user_id: &str, email: &str) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE user_id = $1 OR email = $2 ORDER BY created_at DESC, id DESC",
      ORDER_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .bind(email)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn list_recent(&self, status: Option<&OrderStatus>, limit: i64) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at DESC, id DESC LIMIT $2",
      ORDER_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Order>(&sql)
        .bind(status.map(|s| s.as_str().to_string()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  #[instrument(
    name = "PgOrderStore::apply_payment_update",
    skip_all,
    fields(order_id = %update.order_id, from = %update.expected_status, to = %update.new_status),
    err(Display)
  )]
  async fn apply_payment_update(&self, update: &PaymentUpdate) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE orders \
       SET status = $1, payment_status = $2, updated_at = $3, paid_at = COALESCE($4, paid_at) \
       WHERE id = $5 AND status = $6",
    )
    .bind(update.new_status.as_str())
    .bind(&update.payment_status)
    .bind(update.updated_at)
    .bind(update.paid_at)
    .bind(&update.order_id)
    .bind(update.expected_status.as_str())
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn override_status(&self, order_id: &str, status: &OrderStatus, now: DateTime<Utc>) -> Result<Option<Order>> {
    let mut tx = self.pool.begin().await?;
    let sql = format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS);
    let Some(current) = sqlx::query_as::<_, Order>(&sql)
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await?
    else {
      return Ok(None);
    };

    let paid_at = paid_at_after_override(status, current.paid_at, now);
    let sql = format!(
      "UPDATE orders SET status = $1, paid_at = $2, updated_at = $3 WHERE id = $4 RETURNING {}",
      ORDER_COLUMNS
    );
    let updated = sqlx::query_as::<_, Order>(&sql)
      .bind(status.as_str())
      .bind(paid_at)
      .bind(now)
      .bind(order_id)
      .fetch_one(&mut *tx)
      .await?;
    tx.commit().await?;
    Ok(Some(updated))
  }

  async fn catalog_entry(&self, product_id: &str, variation_id: Option<&str>) -> Result<Option<CatalogEntry>> {
    let entry = match variation_id {
      None => {
        sqlx::query_as::<_, CatalogEntry>(
          "SELECT id AS product_id, NULL::TEXT AS variation_id, name, price AS unit_price FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
      }
      Some(variation_id) => {
        sqlx::query_as::<_, CatalogEntry>(
          "SELECT p.id AS product_id, v.id AS variation_id, p.name || ' - ' || v.name AS name, v.price AS unit_price \
           FROM product_variations v JOIN products p ON p.id = v.product_id \
           WHERE p.id = $1 AND v.id = $2",
        )
        .bind(product_id)
        .bind(variation_id)
        .fetch_optional(&self.pool)
        .await?
      }
    };
    Ok(entry)
  }
}

#[derive(FromRow)]
struct SessionRow {
  user_id: String,
  email: String,
  role: String,
  expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PgSessionStore {
  pool: PgPool,
}

impl PgSessionStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl SessionStore for PgSessionStore {
  async fn find(&self, token: &str) -> Result<Option<Session>> {
    let row = sqlx::query_as::<_, SessionRow>(
      "SELECT user_id, email, role, expires_at FROM sessions WHERE token = $1 AND expires_at > now()",
    )
    .bind(token)
    .fetch_optional(&self.pool)
    .await?;
    Ok(row.map(|r| Session {
      user_id: r.user_id,
      email: r.email,
      role: Role::from_db(&r.role),
      expires_at: r.expires_at,
    }))
  }
}

/// Dedup records shared by every instance and kept across restarts.
#[derive(Clone)]
pub struct PgIdempotencyStore {
  pool: PgPool,
  ttl: Duration,
}

impl PgIdempotencyStore {
  pub fn new(pool: PgPool, ttl: Duration) -> Self {
    Self { pool, ttl }
  }
}

#[async_trait]
impl IdempotencyStore for PgIdempotencyStore {
  async fn claim(&self, event_id: &str) -> Result<bool> {
    let ttl_secs = self.ttl.as_secs_f64();
    // A row older than the retention window is taken over as a fresh claim.
    let result = sqlx::query(
      "INSERT INTO processed_webhook_events (event_id, received_at) VALUES ($1, now()) \
       ON CONFLICT (event_id) DO UPDATE SET received_at = EXCLUDED.received_at \
       WHERE processed_webhook_events.received_at < now() - make_interval(secs => $2)",
    )
    .bind(event_id)
    .bind(ttl_secs)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn release(&self, event_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM processed_webhook_events WHERE event_id = $1")
      .bind(event_id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }
}
