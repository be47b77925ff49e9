// storefront/src/services/mod.rs

//! Payment provider adapters and the helpers the webhook flow shares.

pub mod payment_gateway;
pub mod payment_mock;
pub mod status_mapping;
pub mod stripe_gateway;
pub mod webhook_signature;

pub use payment_gateway::{PaymentGateway, PaymentIntent, PaymentIntentStatus, PaymentWebhookEvent};
pub use payment_mock::MockPaymentGateway;
pub use stripe_gateway::StripeGateway;
