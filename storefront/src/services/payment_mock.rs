// storefront/src/services/payment_mock.rs
use crate::errors::{AppError, Result as AppResult};
use crate::services::payment_gateway::{CreateIntentRequest, PaymentGateway, PaymentIntent, PaymentIntentStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{info, instrument};
use uuid::Uuid;

/// In-process payment gateway used when no provider key is configured, and by tests.
#[derive(Default)]
pub struct MockPaymentGateway {
  intents: Mutex<HashMap<String, PaymentIntent>>,
  fail_next: AtomicBool,
  retrieve_calls: AtomicUsize,
}

impl MockPaymentGateway {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes the next gateway call fail with `AppError::Upstream`.
  pub fn fail_next_call(&self) {
    self.fail_next.store(true, Ordering::SeqCst);
  }

  /// Registers an intent directly, bypassing `create_intent`.
  pub fn insert_intent(&self, id: &str, amount: i64, status: PaymentIntentStatus) {
    self.intents.lock().insert(
      id.to_string(),
      PaymentIntent {
        id: id.to_string(),
        amount,
        currency: "brl".to_string(),
        status,
        client_secret: Some(format!("{}_secret_{}", id, Uuid::new_v4().simple())),
      },
    );
  }

  /// Simulates the provider moving an intent on its own (card confirmed, expired...).
  pub fn set_status(&self, id: &str, status: PaymentIntentStatus) {
    if let Some(intent) = self.intents.lock().get_mut(id) {
      intent.status = status;
    }
  }

  pub fn retrieve_calls(&self) -> usize {
    self.retrieve_calls.load(Ordering::SeqCst)
  }

  pub fn intent_count(&self) -> usize {
    self.intents.lock().len()
  }

  fn check_fail(&self) -> AppResult<()> {
    if self.fail_next.swap(false, Ordering::SeqCst) {
      return Err(AppError::Upstream("Mock gateway configured to fail".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  fn provider_tag(&self) -> &'static str {
    "mock"
  }

  #[instrument(name = "MockPaymentGateway::create_intent", skip_all, fields(order_id = %request.order_id, amount = request.amount))]
  async fn create_intent(&self, request: &CreateIntentRequest) -> AppResult<PaymentIntent> {
    self.check_fail()?;
    if request.amount <= 0 {
      return Err(AppError::Upstream("Amount must be greater than zero".to_string()));
    }

    let intent_id = format!("mock_pi_{}", Uuid::new_v4().simple());
    let intent = PaymentIntent {
      id: intent_id.clone(),
      amount: request.amount,
      currency: request.currency.to_lowercase(),
      status: PaymentIntentStatus::RequiresPaymentMethod,
      client_secret: Some(format!("{}_secret_{}", intent_id, Uuid::new_v4().simple())),
    };
    self.intents.lock().insert(intent_id.clone(), intent.clone());
    info!(payment_intent_id = %intent_id, "Mock payment intent created.");
    Ok(intent)
  }

  #[instrument(name = "MockPaymentGateway::retrieve_intent", skip(self))]
  async fn retrieve_intent(&self, payment_intent_id: &str) -> AppResult<PaymentIntent> {
    self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
    self.check_fail()?;
    self
      .intents
      .lock()
      .get(payment_intent_id)
      .cloned()
      .ok_or_else(|| AppError::Upstream(format!("No such payment_intent: {}", payment_intent_id)))
  }

  #[instrument(name = "MockPaymentGateway::confirm_intent", skip(self))]
  async fn confirm_intent(&self, payment_intent_id: &str) -> AppResult<PaymentIntent> {
    self.check_fail()?;
    let mut intents = self.intents.lock();
    let intent = intents
      .get_mut(payment_intent_id)
      .ok_or_else(|| AppError::Upstream(format!("No such payment_intent: {}", payment_intent_id)))?;
    match intent.status {
      PaymentIntentStatus::Canceled => Err(AppError::Upstream("Cannot confirm a canceled payment intent".to_string())),
      PaymentIntentStatus::Succeeded => Ok(intent.clone()),
      _ => {
        intent.status = PaymentIntentStatus::Succeeded;
        info!("Mock payment SUCCEEDED.");
        Ok(intent.clone())
      }
    }
  }
}
