// storefront/src/models/status.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Internal order status.
///
/// The nominal vocabulary is closed, but webhook deliveries may carry provider
/// statuses with no internal meaning. Those are kept verbatim in `Unmapped`
/// so the stored column still round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
  Pending,
  Processing,
  Completed,
  Cancelled,
  Refunded,
  Unmapped(String),
}

impl OrderStatus {
  pub fn as_str(&self) -> &str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Processing => "processing",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Refunded => "refunded",
      OrderStatus::Unmapped(raw) => raw,
    }
  }

  /// Parses only the closed vocabulary. Used where callers choose a status
  /// themselves (administrative override).
  pub fn parse_known(raw: &str) -> Option<Self> {
    match OrderStatus::from(raw) {
      OrderStatus::Unmapped(_) => None,
      known => Some(known),
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
  }

  /// Whether a webhook may move an order from `self` to `next`.
  ///
  /// Nothing returns to `pending`; cancelled and refunded are final; a
  /// completed order can only be refunded. Re-applying the current status is
  /// not a transition.
  pub fn can_transition_to(&self, next: &OrderStatus) -> bool {
    if self == next || *next == OrderStatus::Pending || self.is_terminal() {
      return false;
    }
    match self {
      OrderStatus::Completed => *next == OrderStatus::Refunded,
      OrderStatus::Processing => *next != OrderStatus::Processing,
      OrderStatus::Pending | OrderStatus::Unmapped(_) => true,
      OrderStatus::Cancelled | OrderStatus::Refunded => false,
    }
  }
}

impl From<&str> for OrderStatus {
  fn from(raw: &str) -> Self {
    match raw {
      "pending" => OrderStatus::Pending,
      "processing" => OrderStatus::Processing,
      "completed" => OrderStatus::Completed,
      "cancelled" => OrderStatus::Cancelled,
      "refunded" => OrderStatus::Refunded,
      other => OrderStatus::Unmapped(other.to_string()),
    }
  }
}

impl From<String> for OrderStatus {
  fn from(raw: String) -> Self {
    OrderStatus::from(raw.as_str())
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for OrderStatus {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for OrderStatus {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    String::deserialize(deserializer).map(OrderStatus::from)
  }
}
