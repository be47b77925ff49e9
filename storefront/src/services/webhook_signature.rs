// storefront/src/services/webhook_signature.rs

//! `x-signature: t=<unix seconds>,v1=<hex hmac-sha256(secret, "<t>.<body>")>`

use crate::errors::{AppError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted distance between the signed timestamp and now.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> Result<String> {
  let mut mac = keyed_mac(secret)?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify(payload: &[u8], header: &str, secret: &str, now: i64) -> Result<()> {
  let rejected = || AppError::Unauthorized("Assinatura do webhook inválida".to_string());

  let mut timestamp = None;
  let mut signature = None;
  for part in header.split(',') {
    match part.trim().split_once('=') {
      Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
      Some(("v1", value)) => signature = Some(value),
      _ => {}
    }
  }
  let (timestamp, signature) = timestamp.zip(signature).ok_or_else(rejected)?;

  if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
    return Err(rejected());
  }

  let expected = hex::decode(signature).map_err(|_| rejected())?;
  let mut mac = keyed_mac(secret)?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  mac.verify_slice(&expected).map_err(|_| rejected())
}

fn keyed_mac(secret: &str) -> Result<HmacSha256> {
  HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Config(format!("Invalid webhook secret: {}", e)))
}
