// storefront/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::pipelines::contexts::{PaymentWebhookCtxData, WebhookOutcome};
use crate::state::AppState;
use orderflow::{ContextData, PipelineResult};

pub const SIGNATURE_HEADER: &str = "x-signature";

/// Payment provider notifications. Any payload that passes validation is
/// acknowledged with 200, whether or not it changed an order.
#[instrument(name = "handler::payment_webhook", skip_all, fields(payload_bytes = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h| h.to_str().ok())
    .map(String::from);

  let ctx = ContextData::new(PaymentWebhookCtxData::new(
    app_state.get_ref().clone(),
    body,
    signature_header,
  ));

  match app_state.flows.run(ctx.clone()).await {
    Ok(result) => {
      let outcome = ctx.with(|c| c.outcome.clone());
      info!(outcome = ?outcome, stopped = (result == PipelineResult::Stopped), "Webhook acknowledged.");
      if outcome == WebhookOutcome::Duplicate {
        return Ok(HttpResponse::Ok().json(json!({ "status": "duplicated" })));
      }
      Ok(HttpResponse::Ok().json(json!({ "received": true })))
    }
    Err(e) => {
      error!(error = %e, "Webhook pipeline failed.");
      Err(e)
    }
  }
}
