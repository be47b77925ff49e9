// storefront/src/state.rs
use crate::config::AppConfig;
use crate::db::{IdempotencyStore, OrderStore, SessionStore};
use crate::errors::AppError;
use crate::pipelines;
use crate::services::PaymentGateway;
use orderflow::Registry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub orders: Arc<dyn OrderStore>,
  pub sessions: Arc<dyn SessionStore>,
  pub idempotency: Arc<dyn IdempotencyStore>,
  pub payments: Arc<dyn PaymentGateway>,
  pub flows: Arc<Registry<AppError>>,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  /// Wires the stores and gateway together and registers every pipeline.
  pub fn new(
    config: AppConfig,
    orders: Arc<dyn OrderStore>,
    sessions: Arc<dyn SessionStore>,
    idempotency: Arc<dyn IdempotencyStore>,
    payments: Arc<dyn PaymentGateway>,
  ) -> Self {
    let flows = Arc::new(Registry::<AppError>::new());
    pipelines::register_all_pipelines(&flows);
    Self {
      orders,
      sessions,
      idempotency,
      payments,
      flows,
      config: Arc::new(config),
    }
  }
}
