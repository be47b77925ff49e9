// storefront/src/pipelines/resume_payment_pipeline.rs

//! Read-through to the provider for an order still awaiting payment. Performs
//! no writes.

use crate::errors::{AppError, Result};
use crate::models::OrderStatus;
use crate::pipelines::contexts::{ResumePaymentCtxData, ResumePaymentResponse};
use crate::services::PaymentIntentStatus;
use orderflow::{ContextData, Pipeline, PipelineControl, Registry, StepDef};
use tracing::{debug, info, warn};

type Ctx = ContextData<ResumePaymentCtxData>;

pub fn register_resume_payment_pipeline(registry: &Registry<AppError>) {
  let mut p = Pipeline::<ResumePaymentCtxData, AppError>::new([
    StepDef::required("load_order"),
    StepDef::required("check_order_state"),
    StepDef::required("retrieve_payment_intent"),
    StepDef::required("check_intent_state"),
    StepDef::required("build_resume_response"),
  ]);

  p.on("load_order", load_order);
  p.on("check_order_state", check_order_state);
  p.on("retrieve_payment_intent", retrieve_payment_intent);
  p.on("check_intent_state", check_intent_state);
  p.on("build_resume_response", build_resume_response);

  registry.register(p);
  info!("Resume payment pipeline registered.");
}

async fn load_order(ctx: Ctx) -> Result<PipelineControl> {
  let (orders, order_id) = ctx.with(|c| (c.app_state.orders.clone(), c.order_id.clone()));
  let order = orders
    .find_order(&order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Pedido não encontrado".to_string()))?;
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn check_order_state(ctx: Ctx) -> Result<PipelineControl> {
  let order = ctx
    .with(|c| c.order.clone())
    .ok_or_else(|| AppError::Internal("Order missing after load step".to_string()))?;

  match order.status {
    OrderStatus::Pending => {}
    OrderStatus::Completed => return Err(AppError::invalid_state("Pedido já foi pago")),
    OrderStatus::Cancelled => return Err(AppError::invalid_state("Pedido cancelado não pode ser pago")),
    ref other => {
      debug!(order_id = %order.id, status = %other, "Order not awaiting payment.");
      return Err(AppError::invalid_state("Pedido não está aguardando pagamento"));
    }
  }
  if order.payment_intent_id.is_none() {
    warn!(order_id = %order.id, "Pending order has no payment intent reference.");
    return Err(AppError::invalid_state("Payment Intent não encontrado para este pedido"));
  }
  Ok(PipelineControl::Continue)
}

async fn retrieve_payment_intent(ctx: Ctx) -> Result<PipelineControl> {
  let (payments, order_id, intent_id) = ctx.with(|c| {
    (
      c.app_state.payments.clone(),
      c.order_id.clone(),
      c.order.as_ref().and_then(|o| o.payment_intent_id.clone()),
    )
  });
  let intent_id = intent_id.ok_or_else(|| AppError::invalid_state("Payment Intent não encontrado para este pedido"))?;

  let intent = payments
    .retrieve_intent(&intent_id)
    .await
    .inspect_err(|e| warn!(order_id = %order_id, payment_ref = %intent_id, error = %e, "Could not retrieve payment intent."))?;
  ctx.write().intent = Some(intent);
  Ok(PipelineControl::Continue)
}

async fn check_intent_state(ctx: Ctx) -> Result<PipelineControl> {
  let status = ctx
    .with(|c| c.intent.as_ref().map(|i| i.status.clone()))
    .ok_or_else(|| AppError::Internal("Payment intent missing after retrieve step".to_string()))?;
  match status {
    PaymentIntentStatus::Succeeded => Err(AppError::invalid_state_refresh(
      "Pagamento já foi confirmado, aguardando processamento",
    )),
    PaymentIntentStatus::Canceled => Err(AppError::invalid_state("Payment Intent foi cancelado")),
    _ => Ok(PipelineControl::Continue),
  }
}

async fn build_resume_response(ctx: Ctx) -> Result<PipelineControl> {
  let mut guard = ctx.write();
  let (Some(order), Some(intent)) = (guard.order.as_ref(), guard.intent.as_ref()) else {
    return Err(AppError::Internal("Resume context incomplete".to_string()));
  };
  let client_secret = intent
    .client_secret
    .clone()
    .ok_or_else(|| AppError::Upstream(format!("Payment intent {} has no client secret", intent.id)))?;

  let response = ResumePaymentResponse {
    client_secret,
    amount: order.total,
    payment_intent_id: intent.id.clone(),
    order_id: order.id.clone(),
    email: order.email.clone(),
  };
  guard.response = Some(response);
  Ok(PipelineControl::Continue)
}
