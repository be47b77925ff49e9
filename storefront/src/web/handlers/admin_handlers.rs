// storefront/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::state::AppState;
use crate::web::extractors::AdminSession;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
  pub status: Option<String>,
  pub limit: Option<i64>,
}

#[instrument(name = "handler::admin_list_orders", skip_all, fields(admin = %admin.0.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  admin: AdminSession,
  query: web::Query<AdminListQuery>,
) -> Result<HttpResponse, AppError> {
  let AdminListQuery { status, limit } = query.into_inner();
  // Unmapped provider statuses are valid filters too.
  let status = status.filter(|s| !s.trim().is_empty()).map(OrderStatus::from);
  let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

  let orders = app_state.orders.list_recent(status.as_ref(), limit).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[derive(Debug, Deserialize)]
pub struct StatusOverrideRequest {
  pub status: String,
}

/// Manual status change. Not subject to the webhook transition rules.
#[instrument(name = "handler::admin_override_status", skip_all, fields(admin = %admin.0.user_id, order_id = %path.as_str()))]
pub async fn override_status_handler(
  app_state: web::Data<AppState>,
  admin: AdminSession,
  path: web::Path<String>,
  payload: web::Json<StatusOverrideRequest>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let requested = payload.into_inner().status;
  let status = OrderStatus::parse_known(requested.trim())
    .ok_or_else(|| AppError::Validation(format!("Status inválido: {}", requested)))?;

  let order = app_state
    .orders
    .override_status(&order_id, &status, Utc::now())
    .await?
    .ok_or_else(|| AppError::NotFound("Pedido não encontrado".to_string()))?;

  info!(status = %order.status, "Order status overridden by admin.");
  Ok(HttpResponse::Ok().json(order))
}
