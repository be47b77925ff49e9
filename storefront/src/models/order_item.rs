// storefront/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// One line of an order. Name and unit price are snapshots taken at checkout;
/// lines are never modified afterwards.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: String,
  pub order_id: String,
  pub product_id: String,
  pub variation_id: Option<String>,
  pub name: String,
  #[serde(with = "rust_decimal::serde::float")]
  pub unit_price: Decimal,
  pub quantity: i32,
  #[serde(with = "rust_decimal::serde::float")]
  pub line_total: Decimal,
}

/// A line item joined with the current catalog display names.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
  #[serde(flatten)]
  #[sqlx(flatten)]
  pub item: OrderItem,
  pub product_name: Option<String>,
  pub variation_name: Option<String>,
}

/// Price and display name of a purchasable product or variation.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CatalogEntry {
  pub product_id: String,
  pub variation_id: Option<String>,
  pub name: String,
  pub unit_price: Decimal,
}
