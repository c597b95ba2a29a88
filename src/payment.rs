//! Payment gateway glue: order creation and callback signature checks.
//!
//! The gateway signs a successful checkout with
//! `hex(HMAC-SHA256(key_secret, "{order_id}|{payment_id}"))`.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::PaymentConfig;
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const CURRENCY: &str = "INR";

fn signing_mac(order_id: &str, payment_id: &str, secret: &str) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac
}

/// Lowercase hex signature for an order/payment pair.
pub fn compute_signature(order_id: &str, payment_id: &str, secret: &str) -> String {
    hex::encode(signing_mac(order_id, payment_id, secret).finalize().into_bytes())
}

/// Length of a hex-encoded HMAC-SHA256 digest.
const SIGNATURE_HEX_LEN: usize = 64;

/// Constant-time check of a hex signature. Only the exact lowercase form
/// [`compute_signature`] produces can verify.
pub fn verify_signature(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    let well_formed = signature.len() == SIGNATURE_HEX_LEN
        && signature
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return false;
    }
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    signing_mac(order_id, payment_id, secret)
        .verify_slice(&expected)
        .is_ok()
}

/// Body posted by the checkout widget after a successful payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentCallback {
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
}

/// A callback with every field present.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedFields<'a> {
    pub order_id: &'a str,
    pub payment_id: &'a str,
    pub signature: &'a str,
}

impl PaymentCallback {
    pub fn fields(&self) -> Result<VerifiedFields<'_>> {
        match (
            present(&self.razorpay_order_id),
            present(&self.razorpay_payment_id),
            present(&self.razorpay_signature),
        ) {
            (Some(order_id), Some(payment_id), Some(signature)) => Ok(VerifiedFields {
                order_id,
                payment_id,
                signature,
            }),
            _ => Err(AppError::PaymentVerification(
                "Missing required payment verification parameters".to_string(),
            )),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Order as the checkout widget needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Minor units (paise).
    pub amount: i64,
    pub currency: String,
}

/// What the checkout widget is opened with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub key_id: String,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Clone)]
enum GatewayMode {
    Remote {
        http: reqwest::Client,
        api_url: String,
    },
    /// No credentials configured: orders are minted locally.
    Offline,
}

#[derive(Clone)]
pub struct PaymentGateway {
    key_id: String,
    key_secret: String,
    mode: GatewayMode,
}

impl PaymentGateway {
    pub fn from_config(config: &PaymentConfig) -> Self {
        let mode = if config.is_offline() {
            GatewayMode::Offline
        } else {
            GatewayMode::Remote {
                http: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_string(),
            }
        };
        Self {
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            mode,
        }
    }

    pub fn offline(key_secret: &str) -> Self {
        Self {
            key_id: "rzp_offline".to_string(),
            key_secret: key_secret.to_string(),
            mode: GatewayMode::Offline,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.mode, GatewayMode::Offline)
    }

    /// Create an order for `amount` whole rupees.
    pub async fn create_order(&self, amount: i64, receipt: &str) -> Result<GatewayOrder> {
        let amount_minor = amount
            .checked_mul(100)
            .ok_or_else(|| AppError::Validation("Amount is too large".to_string()))?;

        match &self.mode {
            GatewayMode::Offline => {
                let order = GatewayOrder {
                    id: format!("order_{}", Uuid::new_v4().simple()),
                    amount: amount_minor,
                    currency: CURRENCY.to_string(),
                };
                tracing::debug!("Minted offline order {} for receipt {}", order.id, receipt);
                Ok(order)
            }
            GatewayMode::Remote { http, api_url } => {
                let resp = http
                    .post(format!("{api_url}/orders"))
                    .basic_auth(&self.key_id, Some(&self.key_secret))
                    .json(&CreateOrderRequest {
                        amount: amount_minor,
                        currency: CURRENCY,
                        receipt,
                    })
                    .send()
                    .await?;

                let status = resp.status();
                let body = resp.text().await?;
                if !status.is_success() {
                    return Err(AppError::Upstream(format!(
                        "payment gateway returned {status}: {body}"
                    )));
                }

                serde_json::from_str::<GatewayOrder>(&body).map_err(|e| {
                    AppError::Upstream(format!("invalid gateway order response: {e}"))
                })
            }
        }
    }

    pub fn checkout(&self, order: GatewayOrder) -> CheckoutDetails {
        CheckoutDetails {
            key_id: self.key_id.clone(),
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
        }
    }

    /// Check a checkout callback against the configured key secret.
    pub fn verify(&self, fields: VerifiedFields<'_>) -> Result<()> {
        if verify_signature(
            fields.order_id,
            fields.payment_id,
            fields.signature,
            &self.key_secret,
        ) {
            Ok(())
        } else {
            Err(AppError::PaymentVerification(
                "Payment verification failed: Invalid signature".to_string(),
            ))
        }
    }

    /// Signature the gateway would send for this pair; used by the offline
    /// checkout page and tests.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        compute_signature(order_id, payment_id, &self.key_secret)
    }
}
