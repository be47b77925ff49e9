// storefront/src/pipelines/contexts.rs

//! Context structs the pipelines run against. Handlers fill in the `Option`
//! fields as steps complete; request handlers read them back afterwards.

use crate::models::{Order, OrderItem, Session};
use crate::services::{PaymentIntent, PaymentWebhookEvent};
use crate::state::AppState;
use actix_web::web::Bytes;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What the webhook flow did with an event, for logs and the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
  /// Not yet decided (run failed or stopped before the update step).
  Undecided,
  /// Event id already processed; nothing done.
  Duplicate,
  /// Event carries no payment status change we act on.
  Ignored,
  /// No order references the payment.
  OrderNotFound,
  /// Transition not allowed, or the order changed under us.
  Skipped,
  Applied,
}

#[derive(Clone)]
pub struct PaymentWebhookCtxData {
  pub app_state: AppState,
  pub raw_payload: Bytes,
  pub signature_header: Option<String>,
  pub event: Option<PaymentWebhookEvent>,
  pub outcome: WebhookOutcome,
  pub affected_order_id: Option<String>,
}

impl PaymentWebhookCtxData {
  pub fn new(app_state: AppState, raw_payload: Bytes, signature_header: Option<String>) -> Self {
    Self {
      app_state,
      raw_payload,
      signature_header,
      event: None,
      outcome: WebhookOutcome::Undecided,
      affected_order_id: None,
    }
  }
}

/// Body returned to a client resuming payment confirmation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePaymentResponse {
  pub client_secret: String,
  #[serde(with = "rust_decimal::serde::float")]
  pub amount: Decimal,
  pub payment_intent_id: String,
  pub order_id: String,
  pub email: String,
}

#[derive(Clone)]
pub struct ResumePaymentCtxData {
  pub app_state: AppState,
  pub order_id: String,
  pub order: Option<Order>,
  pub intent: Option<PaymentIntent>,
  pub response: Option<ResumePaymentResponse>,
}

impl ResumePaymentCtxData {
  pub fn new(app_state: AppState, order_id: String) -> Self {
    Self {
      app_state,
      order_id,
      order: None,
      intent: None,
      response: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineRequest {
  pub product_id: String,
  #[serde(default)]
  pub variation_id: Option<String>,
  pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  pub email: String,
  pub items: Vec<CheckoutLineRequest>,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default, with = "rust_decimal::serde::float_option")]
  pub discount_amount: Option<Decimal>,
  /// Must match the configured gateway when given.
  #[serde(default)]
  pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
  pub order_id: String,
  pub client_secret: Option<String>,
  pub payment_intent_id: String,
  #[serde(with = "rust_decimal::serde::float")]
  pub amount: Decimal,
  pub currency: String,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub request: CheckoutRequest,
  pub session: Option<Session>,
  pub order_id: String,
  pub currency: String,
  pub items: Vec<OrderItem>,
  pub subtotal: Decimal,
  pub discount_amount: Decimal,
  pub total: Decimal,
  pub intent: Option<PaymentIntent>,
  pub order: Option<Order>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, request: CheckoutRequest, session: Option<Session>, order_id: String) -> Self {
    Self {
      app_state,
      request,
      session,
      order_id,
      currency: String::new(),
      items: Vec::new(),
      subtotal: Decimal::ZERO,
      discount_amount: Decimal::ZERO,
      total: Decimal::ZERO,
      intent: None,
      order: None,
    }
  }
}
