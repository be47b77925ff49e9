// storefront/src/services/payment_gateway.rs

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Provider-side lifecycle of a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
  RequiresPaymentMethod,
  RequiresConfirmation,
  RequiresAction,
  Processing,
  RequiresCapture,
  Succeeded,
  Canceled,
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
  pub id: String,
  /// Minor currency units.
  pub amount: i64,
  pub currency: String,
  pub status: PaymentIntentStatus,
  pub client_secret: Option<String>,
}

/// Everything needed to open a payment intent for an order.
#[derive(Debug, Clone)]
pub struct CreateIntentRequest {
  pub order_id: String,
  pub amount: i64,
  pub currency: String,
  pub email: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Tag stored on orders created through this gateway.
  fn provider_tag(&self) -> &'static str;

  async fn create_intent(&self, request: &CreateIntentRequest) -> Result<PaymentIntent>;

  async fn retrieve_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent>;

  async fn confirm_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent>;
}

/// Webhook body: `{ id, type, data: { id, status? } }`.
///
/// `id` identifies the delivery (dedup key); `data.id` is the payment reference.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookEvent {
  pub id: String,
  #[serde(rename = "type")]
  pub event_type: String,
  pub data: PaymentWebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookData {
  pub id: String,
  #[serde(default)]
  pub status: Option<String>,
}

pub const PAYMENT_UPDATED_EVENT: &str = "payment.updated";

impl PaymentWebhookEvent {
  /// Parses and validates a raw webhook body.
  pub fn parse(raw: &[u8]) -> Result<Self> {
    let event: PaymentWebhookEvent =
      serde_json::from_slice(raw).map_err(|e| AppError::Validation(format!("Payload inválido: {}", e)))?;
    if event.id.trim().is_empty() {
      return Err(AppError::Validation("Payload inválido: id vazio".to_string()));
    }
    if event.event_type.trim().is_empty() {
      return Err(AppError::Validation("Payload inválido: type vazio".to_string()));
    }
    if event.data.id.trim().is_empty() {
      return Err(AppError::Validation("Payload inválido: data.id vazio".to_string()));
    }
    Ok(event)
  }

  /// Provider status for a `payment.updated` event, if it carries one.
  pub fn payment_status(&self) -> Option<&str> {
    if self.event_type != PAYMENT_UPDATED_EVENT {
      return None;
    }
    self.data.status.as_deref().filter(|s| !s.is_empty())
  }
}

/// Converts a decimal amount to minor units (two decimal places).
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
  (amount * Decimal::ONE_HUNDRED)
    .round()
    .to_i64()
    .ok_or_else(|| AppError::Validation(format!("Valor fora do intervalo: {}", amount)))
}
