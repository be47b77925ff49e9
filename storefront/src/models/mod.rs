// storefront/src/models/mod.rs

//! Data structures for orders, their line items and sessions.

pub mod order;
pub mod order_item;
pub mod session;
pub mod status;

pub use order::{new_id, Order};
pub use order_item::{CatalogEntry, OrderItem, OrderItemView};
pub use session::{Role, Session};
pub use status::OrderStatus;
