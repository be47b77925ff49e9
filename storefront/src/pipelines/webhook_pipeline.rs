// storefront/src/pipelines/webhook_pipeline.rs

use crate::db::PaymentUpdate;
use crate::errors::{AppError, Result};
use crate::models::OrderStatus;
use crate::pipelines::contexts::{PaymentWebhookCtxData, WebhookOutcome};
use crate::services::status_mapping::map_provider_status;
use crate::services::{webhook_signature, PaymentWebhookEvent};
use crate::state::AppState;
use chrono::Utc;
use orderflow::{ContextData, Pipeline, PipelineControl, Registry, StepDef};
use tracing::{debug, error, info, instrument, warn};

type Ctx = ContextData<PaymentWebhookCtxData>;

pub fn register_webhook_pipeline(registry: &Registry<AppError>) {
  let mut p = Pipeline::<PaymentWebhookCtxData, AppError>::new([
    StepDef::required("verify_webhook_signature")
      .skip_when(|ctx: Ctx| ctx.with(|c| c.app_state.config.webhook_secret.is_none())),
    StepDef::required("parse_webhook_payload"),
    StepDef::required("deduplicate_event"),
    StepDef::required("apply_payment_update"),
    StepDef::optional("acknowledge_webhook"),
  ]);

  p.on("verify_webhook_signature", verify_webhook_signature);
  p.on("parse_webhook_payload", parse_webhook_payload);
  p.on("deduplicate_event", deduplicate_event);
  p.on("apply_payment_update", apply_payment_update);
  p.on("acknowledge_webhook", acknowledge_webhook);

  registry.register(p);
  info!("Payment webhook pipeline registered.");
}

async fn verify_webhook_signature(ctx: Ctx) -> Result<PipelineControl> {
  let (payload, header, secret) = ctx.with(|c| {
    (
      c.raw_payload.clone(),
      c.signature_header.clone(),
      c.app_state.config.webhook_secret.clone(),
    )
  });
  let Some(secret) = secret else {
    return Ok(PipelineControl::Continue);
  };
  let Some(header) = header else {
    warn!("Webhook delivered without a signature header.");
    return Err(AppError::Unauthorized("Assinatura do webhook ausente".to_string()));
  };
  webhook_signature::verify(&payload, &header, &secret, Utc::now().timestamp())?;
  debug!("Webhook signature verified.");
  Ok(PipelineControl::Continue)
}

async fn parse_webhook_payload(ctx: Ctx) -> Result<PipelineControl> {
  let payload = ctx.with(|c| c.raw_payload.clone());
  let event = PaymentWebhookEvent::parse(&payload).inspect_err(|e| warn!(error = %e, "Rejecting webhook payload."))?;
  info!(event_id = %event.id, event_type = %event.event_type, payment_ref = %event.data.id, "Webhook event received.");
  ctx.write().event = Some(event);
  Ok(PipelineControl::Continue)
}

async fn deduplicate_event(ctx: Ctx) -> Result<PipelineControl> {
  let (idempotency, event_id) = ctx.with(|c| (c.app_state.idempotency.clone(), c.event.as_ref().map(|e| e.id.clone())));
  let event_id = event_id.ok_or_else(|| AppError::Internal("Webhook event missing after parse step".to_string()))?;

  if idempotency.claim(&event_id).await? {
    return Ok(PipelineControl::Continue);
  }
  info!(event_id = %event_id, "Duplicate webhook event, skipping.");
  ctx.write().outcome = WebhookOutcome::Duplicate;
  Ok(PipelineControl::Stop)
}

/// Applies the status change and releases the dedup claim if it fails, so a
/// provider retry is processed rather than reported as a duplicate.
async fn apply_payment_update(ctx: Ctx) -> Result<PipelineControl> {
  let (state, event) = ctx.with(|c| (c.app_state.clone(), c.event.clone()));
  let event = event.ok_or_else(|| AppError::Internal("Webhook event missing after parse step".to_string()))?;

  match update_order_for_event(&ctx, &state, &event).await {
    Ok(outcome) => {
      ctx.write().outcome = outcome;
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      error!(event_id = %event.id, payment_ref = %event.data.id, error = %e, "Failed to apply webhook event.");
      if let Err(release_err) = state.idempotency.release(&event.id).await {
        error!(event_id = %event.id, error = %release_err, "Failed to release webhook event claim.");
      }
      Err(e)
    }
  }
}

#[instrument(name = "webhook::update_order", skip_all, fields(event_id = %event.id, payment_ref = %event.data.id))]
async fn update_order_for_event(
  ctx: &Ctx,
  state: &AppState,
  event: &PaymentWebhookEvent,
) -> Result<WebhookOutcome> {
  let Some(provider_status) = event.payment_status() else {
    debug!(event_type = %event.event_type, "Event carries no payment status change.");
    return Ok(WebhookOutcome::Ignored);
  };

  let Some(order) = state.orders.find_by_payment_intent(&event.data.id).await? else {
    warn!("No order matches payment reference; acknowledging without changes.");
    return Ok(WebhookOutcome::OrderNotFound);
  };
  ctx.write().affected_order_id = Some(order.id.clone());

  let new_status = map_provider_status(provider_status);
  if let OrderStatus::Unmapped(raw) = &new_status {
    warn!(order_id = %order.id, provider_status = %raw, "Provider status has no internal mapping; storing verbatim.");
  }
  if !order.status.can_transition_to(&new_status) {
    warn!(order_id = %order.id, from = %order.status, to = %new_status, "Status transition not allowed, skipping.");
    return Ok(WebhookOutcome::Skipped);
  }

  let now = Utc::now();
  let update = PaymentUpdate {
    order_id: order.id.clone(),
    expected_status: order.status.clone(),
    paid_at: (new_status == OrderStatus::Completed).then_some(now),
    new_status,
    payment_status: provider_status.to_string(),
    updated_at: now,
  };
  if !state.orders.apply_payment_update(&update).await? {
    warn!(order_id = %order.id, "Order changed concurrently; webhook update skipped.");
    return Ok(WebhookOutcome::Skipped);
  }

  info!(order_id = %order.id, from = %update.expected_status, to = %update.new_status, "Order status updated from webhook.");
  Ok(WebhookOutcome::Applied)
}

async fn acknowledge_webhook(ctx: Ctx) -> Result<PipelineControl> {
  let (event_id, outcome, order_id) = ctx.with(|c| {
    (
      c.event.as_ref().map(|e| e.id.clone()).unwrap_or_default(),
      c.outcome.clone(),
      c.affected_order_id.clone(),
    )
  });
  debug!(event_id = %event_id, outcome = ?outcome, order_id = ?order_id, "Webhook processed.");
  Ok(PipelineControl::Continue)
}
