// storefront/src/services/status_mapping.rs

//! Provider status vocabulary → internal order status.

use crate::models::OrderStatus;

/// Maps a provider status (case-sensitive) to the internal order status.
///
/// Unrecognised provider strings pass through verbatim.
pub fn map_provider_status(provider_status: &str) -> OrderStatus {
  match provider_status {
    "approved" | "paid" => OrderStatus::Completed,
    "cancelled" | "rejected" => OrderStatus::Cancelled,
    "refunded" => OrderStatus::Refunded,
    other => OrderStatus::from(other),
  }
}
