// tests/common/mod.rs
#![allow(dead_code)]

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use storefront::config::AppConfig;
use storefront::db::{InMemoryIdempotencyStore, InMemoryOrderStore, InMemorySessionStore, OrderStore};
use storefront::models::{Order, OrderItem, OrderStatus, Role, Session};
use storefront::services::MockPaymentGateway;
use storefront::state::AppState;
use tracing::Level;

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

/// In-memory wiring with handles on the concrete stores for seeding and asserting.
pub struct TestApp {
  pub state: AppState,
  pub orders: Arc<InMemoryOrderStore>,
  pub sessions: Arc<InMemorySessionStore>,
  pub payments: Arc<MockPaymentGateway>,
}

impl TestApp {
  pub fn new() -> Self {
    Self::with_config(AppConfig::default())
  }

  pub fn with_config(config: AppConfig) -> Self {
    setup_tracing();
    let orders = Arc::new(InMemoryOrderStore::new());
    let sessions = Arc::new(InMemorySessionStore::new());
    let payments = Arc::new(MockPaymentGateway::new());
    let idempotency = Arc::new(InMemoryIdempotencyStore::new(Duration::from_secs(3600)));
    let state = AppState::new(
      config,
      orders.clone(),
      sessions.clone(),
      idempotency,
      payments.clone(),
    );
    Self {
      state,
      orders,
      sessions,
      payments,
    }
  }

  pub async fn seed(&self, order: &Order, items: &[OrderItem]) {
    self.orders.insert_order(order, items).await.unwrap();
  }

  pub async fn order(&self, order_id: &str) -> Order {
    self.orders.find_order(order_id).await.unwrap().expect("order exists")
  }

  /// Registers a session under `token` and returns it.
  pub fn login(&self, token: &str, user_id: &str, email: &str, role: Role) -> Session {
    let session = Session {
      user_id: user_id.to_string(),
      email: email.to_string(),
      role,
      expires_at: Utc::now() + ChronoDuration::hours(1),
    };
    self.sessions.insert(token, session.clone());
    session
  }
}

/// Builds the service under test from a `TestApp`.
#[macro_export]
macro_rules! init_app {
  ($app:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($app.state.clone()))
        .configure(storefront::web::configure_app_routes),
    )
    .await
  };
}

pub fn money(raw: &str) -> Decimal {
  raw.parse().unwrap()
}

pub fn order_fixture(id: &str, status: OrderStatus, payment_intent_id: Option<&str>, total: &str) -> Order {
  let now = Utc::now();
  Order {
    id: id.to_string(),
    email: "buyer@example.com".to_string(),
    user_id: None,
    subtotal: money(total),
    discount_amount: Decimal::ZERO,
    total: money(total),
    currency: "BRL".to_string(),
    status,
    payment_provider: Some("mock".to_string()),
    payment_intent_id: payment_intent_id.map(String::from),
    legacy_payment_id: None,
    payment_status: None,
    created_at: now,
    updated_at: now,
    paid_at: None,
  }
}

pub fn created_minutes_ago(mut order: Order, minutes: i64) -> Order {
  let at: DateTime<Utc> = Utc::now() - ChronoDuration::minutes(minutes);
  order.created_at = at;
  order.updated_at = at;
  order
}

pub fn item_fixture(order_id: &str, product_id: &str, unit_price: &str, quantity: i32) -> OrderItem {
  let unit_price = money(unit_price);
  OrderItem {
    id: format!("item_{}_{}", order_id, product_id),
    order_id: order_id.to_string(),
    product_id: product_id.to_string(),
    variation_id: None,
    name: format!("Produto {}", product_id),
    unit_price,
    quantity,
    line_total: unit_price * Decimal::from(quantity),
  }
}
