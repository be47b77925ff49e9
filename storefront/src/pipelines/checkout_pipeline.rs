// storefront/src/pipelines/checkout_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::{new_id, Order, OrderItem, OrderStatus};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::payment_gateway::{to_minor_units, CreateIntentRequest};
use chrono::Utc;
use orderflow::{ContextData, Pipeline, PipelineControl, Registry, StepDef};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

type Ctx = ContextData<CheckoutCtxData>;

const MAX_LINE_QUANTITY: i32 = 100;

pub fn register_checkout_pipeline(registry: &Registry<AppError>) {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new([
    StepDef::required("validate_checkout"),
    StepDef::required("price_items"),
    StepDef::required("compute_totals"),
    StepDef::required("create_payment_intent"),
    StepDef::required("persist_order"),
  ]);

  p.on("validate_checkout", validate_checkout);
  p.on("price_items", price_items);
  p.on("compute_totals", compute_totals);
  p.on("create_payment_intent", create_payment_intent);
  p.on("persist_order", persist_order);

  registry.register(p);
  info!("Checkout pipeline registered.");
}

async fn validate_checkout(ctx: Ctx) -> Result<PipelineControl> {
  let mut guard = ctx.write();
  let request = &guard.request;

  let email = request.email.trim();
  if email.is_empty() || !email.contains('@') {
    return Err(AppError::Validation("Email inválido".to_string()));
  }
  if request.items.is_empty() {
    return Err(AppError::Validation("O pedido precisa de ao menos um item".to_string()));
  }
  if let Some(line) = request
    .items
    .iter()
    .find(|l| l.quantity < 1 || l.quantity > MAX_LINE_QUANTITY)
  {
    return Err(AppError::Validation(format!(
      "Quantidade inválida para o produto {}",
      line.product_id
    )));
  }
  if request.discount_amount.is_some_and(|d| d < Decimal::ZERO) {
    return Err(AppError::Validation("Desconto não pode ser negativo".to_string()));
  }
  let gateway_tag = guard.app_state.payments.provider_tag();
  if let Some(provider) = request.provider.as_deref() {
    if provider != gateway_tag {
      return Err(AppError::Validation(format!("Provedor de pagamento não suportado: {}", provider)));
    }
  }

  let currency = request
    .currency
    .as_deref()
    .map(|c| c.trim().to_uppercase())
    .filter(|c| !c.is_empty())
    .unwrap_or_else(|| guard.app_state.config.default_currency.clone());
  if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
    return Err(AppError::Validation(format!("Moeda inválida: {}", currency)));
  }

  let email = email.to_string();
  guard.currency = currency;
  guard.request.email = email;
  Ok(PipelineControl::Continue)
}

async fn price_items(ctx: Ctx) -> Result<PipelineControl> {
  let (orders, order_id, lines) = ctx.with(|c| (c.app_state.orders.clone(), c.order_id.clone(), c.request.items.clone()));

  let mut items = Vec::with_capacity(lines.len());
  for line in &lines {
    let entry = orders
      .catalog_entry(&line.product_id, line.variation_id.as_deref())
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Produto não encontrado: {}", line.product_id)))?;
    let line_total = entry.unit_price * Decimal::from(line.quantity);
    items.push(OrderItem {
      id: new_id("item"),
      order_id: order_id.clone(),
      product_id: entry.product_id,
      variation_id: entry.variation_id,
      name: entry.name,
      unit_price: entry.unit_price,
      quantity: line.quantity,
      line_total,
    });
  }
  debug!(order_id = %order_id, lines = items.len(), "Checkout lines priced.");
  ctx.write().items = items;
  Ok(PipelineControl::Continue)
}

async fn compute_totals(ctx: Ctx) -> Result<PipelineControl> {
  ctx.update(|c| {
    c.subtotal = c.items.iter().map(|i| i.line_total).sum();
    c.discount_amount = c.request.discount_amount.unwrap_or(Decimal::ZERO).min(c.subtotal);
    c.total = c.subtotal - c.discount_amount;
  });
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout::create_payment_intent", skip_all)]
async fn create_payment_intent(ctx: Ctx) -> Result<PipelineControl> {
  let (payments, order_id, total, currency, email) = ctx.with(|c| {
    (
      c.app_state.payments.clone(),
      c.order_id.clone(),
      c.total,
      c.currency.clone(),
      c.request.email.clone(),
    )
  });
  if total <= Decimal::ZERO {
    return Err(AppError::Validation("Total do pedido deve ser maior que zero".to_string()));
  }

  let intent = payments
    .create_intent(&CreateIntentRequest {
      order_id: order_id.clone(),
      amount: to_minor_units(total)?,
      currency,
      email,
    })
    .await?;
  info!(order_id = %order_id, payment_ref = %intent.id, "Payment intent created.");
  ctx.write().intent = Some(intent);
  Ok(PipelineControl::Continue)
}

async fn persist_order(ctx: Ctx) -> Result<PipelineControl> {
  let data = ctx.snapshot();
  let state = &data.app_state;
  let intent = data
    .intent
    .as_ref()
    .ok_or_else(|| AppError::Internal("Payment intent missing after create step".to_string()))?;

  let now = Utc::now();
  let order = Order {
    id: data.order_id.clone(),
    email: data.request.email.clone(),
    user_id: data.session.as_ref().map(|s| s.user_id.clone()),
    subtotal: data.subtotal,
    discount_amount: data.discount_amount,
    total: data.total,
    currency: data.currency.clone(),
    status: OrderStatus::Pending,
    payment_provider: Some(state.payments.provider_tag().to_string()),
    payment_intent_id: Some(intent.id.clone()),
    legacy_payment_id: None,
    payment_status: None,
    created_at: now,
    updated_at: now,
    paid_at: None,
  };
  state.orders.insert_order(&order, &data.items).await?;
  info!(order_id = %order.id, total = %order.total, "Order persisted.");
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}
