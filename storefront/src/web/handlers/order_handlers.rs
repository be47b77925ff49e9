// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::{Order, OrderItem};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedSession;

const DEBUG_RECENT_ORDERS: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderWithItems {
  #[serde(flatten)]
  order: Order,
  items: Vec<OrderItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomerOrder {
  #[serde(flatten)]
  order: Order,
  items: Vec<OrderItem>,
  item_count: usize,
}

#[instrument(name = "handler::get_order", skip_all, fields(order_id = %path.as_str(), user_id = %session.0.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  session: AuthenticatedSession,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let AuthenticatedSession(session) = session;

  let order = app_state
    .orders
    .find_order(&order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Pedido não encontrado".to_string()))?;
  if order.user_id.as_deref() != Some(session.user_id.as_str()) {
    warn!(owner = ?order.user_id, "Order requested by a user who does not own it.");
    return Err(AppError::Forbidden("Acesso negado".to_string()));
  }

  let items = app_state.orders.list_items(&order.id).await?;
  Ok(HttpResponse::Ok().json(OrderWithItems { order, items }))
}

/// Orders owned by the session user or placed with the session email.
#[instrument(name = "handler::my_orders", skip_all, fields(user_id = %session.0.user_id))]
pub async fn my_orders_handler(
  app_state: web::Data<AppState>,
  session: AuthenticatedSession,
) -> Result<HttpResponse, AppError> {
  let AuthenticatedSession(session) = session;
  let orders = app_state
    .orders
    .list_for_customer(&session.user_id, &session.email)
    .await?;

  let mut out = Vec::with_capacity(orders.len());
  for order in orders {
    let items = app_state.orders.list_items(&order.id).await?;
    out.push(CustomerOrder {
      item_count: items.len(),
      order,
      items,
    });
  }
  info!(count = out.len(), "Customer orders listed.");
  Ok(HttpResponse::Ok().json(json!({ "orders": out })))
}

#[derive(Debug, Deserialize)]
pub struct ByPaymentQuery {
  pub payment_intent: Option<String>,
}

/// Used by the post-checkout confirmation page, which may not have a session yet.
#[instrument(name = "handler::order_by_payment", skip_all, fields(payment_ref = ?query.payment_intent))]
pub async fn order_by_payment_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ByPaymentQuery>,
) -> Result<HttpResponse, AppError> {
  let payment_ref = query
    .into_inner()
    .payment_intent
    .filter(|p| !p.trim().is_empty())
    .ok_or_else(|| AppError::Validation("payment_intent é obrigatório".to_string()))?;

  let Some(order) = app_state.orders.find_by_payment_intent(&payment_ref).await? else {
    warn!("No order for payment reference.");
    if !app_state.config.expose_error_details() {
      return Err(AppError::NotFound("Pedido não encontrado".to_string()));
    }
    let recent = app_state.orders.list_recent(None, DEBUG_RECENT_ORDERS).await?;
    let recent: Vec<_> = recent
      .iter()
      .map(|o| {
        json!({
          "id": o.id,
          "paymentIntentId": o.payment_intent_id,
          "status": o.status,
          "createdAt": o.created_at,
        })
      })
      .collect();
    return Ok(HttpResponse::NotFound().json(json!({
      "error": "Pedido não encontrado",
      "debug": { "searchedPaymentIntent": payment_ref, "recentOrders": recent },
    })));
  };

  let items = app_state.orders.list_item_views(&order.id).await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order, "items": items })))
}

#[derive(Debug, Deserialize)]
pub struct LegacyStatusQuery {
  #[serde(rename = "paymentId")]
  pub payment_id: Option<String>,
}

/// Status lookup by the previous integration's payment id.
#[instrument(name = "handler::legacy_status", skip_all, fields(payment_id = ?query.payment_id))]
pub async fn legacy_status_handler(
  app_state: web::Data<AppState>,
  query: web::Query<LegacyStatusQuery>,
) -> Result<HttpResponse, AppError> {
  let payment_id = query
    .into_inner()
    .payment_id
    .filter(|p| !p.trim().is_empty())
    .ok_or_else(|| AppError::Validation("paymentId é obrigatório".to_string()))?;

  let order = app_state
    .orders
    .find_by_legacy_payment_id(&payment_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Pedido não encontrado".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "status": order.status })))
}
