// storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::ResumePaymentCtxData;
use crate::state::AppState;
use orderflow::ContextData;

#[derive(Debug, Deserialize)]
pub struct ResumePaymentQuery {
  #[serde(rename = "orderId")]
  pub order_id: Option<String>,
}

#[instrument(name = "handler::resume_payment", skip_all, fields(order_id = ?query.order_id))]
pub async fn resume_payment_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ResumePaymentQuery>,
) -> Result<HttpResponse, AppError> {
  let order_id = query
    .into_inner()
    .order_id
    .map(|id| id.trim().to_string())
    .filter(|id| !id.is_empty())
    .ok_or_else(|| AppError::Validation("orderId é obrigatório".to_string()))?;

  let ctx = ContextData::new(ResumePaymentCtxData::new(app_state.get_ref().clone(), order_id));
  app_state.flows.run(ctx.clone()).await?;

  let response = ctx.write().response.take().ok_or_else(|| {
    warn!("Resume payment pipeline finished without a response.");
    AppError::Internal("Resume payment produced no response".to_string())
  })?;
  Ok(HttpResponse::Ok().json(response))
}
