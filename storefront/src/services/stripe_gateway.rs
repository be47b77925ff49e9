// storefront/src/services/stripe_gateway.rs

use crate::errors::{AppError, Result};
use crate::services::payment_gateway::{CreateIntentRequest, PaymentGateway, PaymentIntent};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Payment intents over the provider's REST API (form-encoded requests,
/// bearer secret key).
pub struct StripeGateway {
  http: reqwest::Client,
  api_base: String,
  secret_key: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
  error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
  #[serde(default)]
  code: Option<String>,
  #[serde(default)]
  message: Option<String>,
}

impl StripeGateway {
  pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build payment HTTP client: {}", e)))?;
    Ok(Self {
      http,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    })
  }

  async fn read_intent(&self, response: reqwest::Response) -> Result<PaymentIntent> {
    let status = response.status();
    if status.is_success() {
      return Ok(response.json::<PaymentIntent>().await?);
    }
    let body = response
      .text()
      .await
      .inspect_err(|e| error!(http_status = %status, error = %e, "Failed to read payment provider error body."))
      .ok();
    let detail = provider_error_detail(body.as_deref());
    error!(http_status = %status, %detail, "Payment provider returned an error.");
    Err(AppError::Upstream(format!("HTTP {}: {}", status, detail)))
  }
}

/// Human-readable detail for a non-2xx provider response. `None` means the
/// body could not be read.
fn provider_error_detail(body: Option<&str>) -> String {
  let Some(body) = body else {
    return "response body unavailable".to_string();
  };
  match serde_json::from_str::<ProviderErrorBody>(body) {
    Ok(parsed) => format!(
      "{} ({})",
      parsed.error.message.unwrap_or_default(),
      parsed.error.code.unwrap_or_else(|| "no_code".to_string())
    ),
    Err(_) => body.to_string(),
  }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  fn provider_tag(&self) -> &'static str {
    "stripe"
  }

  #[instrument(name = "StripeGateway::create_intent", skip_all, fields(order_id = %request.order_id, amount = request.amount), err(Display))]
  async fn create_intent(&self, request: &CreateIntentRequest) -> Result<PaymentIntent> {
    let amount = request.amount.to_string();
    let currency = request.currency.to_lowercase();
    let form = [
      ("amount", amount.as_str()),
      ("currency", currency.as_str()),
      ("receipt_email", request.email.as_str()),
      ("metadata[order_id]", request.order_id.as_str()),
      ("automatic_payment_methods[enabled]", "true"),
    ];
    let response = self
      .http
      .post(format!("{}/payment_intents", self.api_base))
      .bearer_auth(&self.secret_key)
      .header("Idempotency-Key", format!("order-{}", request.order_id))
      .form(&form)
      .send()
      .await?;
    let intent = self.read_intent(response).await?;
    info!(payment_intent_id = %intent.id, "Payment intent created.");
    Ok(intent)
  }

  #[instrument(name = "StripeGateway::retrieve_intent", skip(self), err(Display))]
  async fn retrieve_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent> {
    let response = self
      .http
      .get(format!("{}/payment_intents/{}", self.api_base, payment_intent_id))
      .bearer_auth(&self.secret_key)
      .send()
      .await?;
    self.read_intent(response).await
  }

  #[instrument(name = "StripeGateway::confirm_intent", skip(self), err(Display))]
  async fn confirm_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent> {
    let response = self
      .http
      .post(format!("{}/payment_intents/{}/confirm", self.api_base, payment_intent_id))
      .bearer_auth(&self.secret_key)
      .send()
      .await?;
    self.read_intent(response).await
  }
}
