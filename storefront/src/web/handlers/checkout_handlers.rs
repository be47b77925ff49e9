// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::new_id;
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutRequest, CheckoutResponse};
use crate::state::AppState;
use crate::web::extractors::MaybeSession;
use orderflow::ContextData;

#[instrument(
  name = "handler::checkout",
  skip_all,
  fields(order_id = tracing::field::Empty, lines = payload.items.len(), authenticated = session.0.is_some())
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  session: MaybeSession,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let order_id = new_id("ord");
  tracing::Span::current().record("order_id", order_id.as_str());

  let ctx = ContextData::new(CheckoutCtxData::new(
    app_state.get_ref().clone(),
    payload.into_inner(),
    session.0,
    order_id,
  ));
  app_state.flows.run(ctx.clone()).await?;

  let response = ctx.with(|c| {
    let (order, intent) = (c.order.as_ref()?, c.intent.as_ref()?);
    Some(CheckoutResponse {
      order_id: order.id.clone(),
      client_secret: intent.client_secret.clone(),
      payment_intent_id: intent.id.clone(),
      amount: order.total,
      currency: order.currency.clone(),
    })
  });
  let response = response.ok_or_else(|| {
    warn!("Checkout pipeline finished without an order.");
    AppError::Internal("Checkout produced no order".to_string())
  })?;

  info!(order_id = %response.order_id, "Checkout completed.");
  Ok(HttpResponse::Created().json(response))
}
