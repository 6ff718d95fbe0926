//! Stripe integration via REST API (no SDK dependency)
//!
//! 支付意图创建 + webhook 签名验证。金额一律换算为最小货币单位 (分)。

use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use sha2::Sha256;

use crate::utils::error::AppError;

/// Webhook 重放窗口 (秒)
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Created payment intent (subset of the Stripe response we use)
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Stripe webhook event envelope
///
/// 字段全部宽松反序列化：未知事件类型也要解析成功，由调用方决定忽略。
#[derive(Debug, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(default, rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub object: PaymentIntentObject,
}

/// The payment_intent object carried in webhook events
#[derive(Debug, Default, Deserialize)]
pub struct PaymentIntentObject {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub metadata: IntentMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct IntentMetadata {
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// 订单金额换算为最小货币单位
///
/// 半数进位远离零，和收银端的四舍五入一致。
pub fn to_minor_units(amount: Decimal) -> i64 {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Create a Stripe PaymentIntent for an order
pub async fn create_payment_intent(
    secret_key: &str,
    amount: Decimal,
    order_id: &str,
    user_id: &str,
) -> Result<PaymentIntent, AppError> {
    let amount_minor = to_minor_units(amount).to_string();

    let client = reqwest::Client::new();
    let resp: serde_json::Value = client
        .post("https://api.stripe.com/v1/payment_intents")
        .basic_auth(secret_key, None::<&str>)
        .form(&[
            ("amount", amount_minor.as_str()),
            ("currency", "usd"),
            ("metadata[orderId]", order_id),
            ("metadata[userId]", user_id),
        ])
        .send()
        .await
        .map_err(|e| AppError::Internal(format!("Stripe request failed: {e}")))?
        .json()
        .await
        .map_err(|e| AppError::Internal(format!("Stripe response parse failed: {e}")))?;

    match (resp["id"].as_str(), resp["client_secret"].as_str()) {
        (Some(id), Some(client_secret)) => Ok(PaymentIntent {
            id: id.to_string(),
            client_secret: client_secret.to_string(),
        }),
        _ => Err(AppError::Internal(format!(
            "Stripe create_payment_intent failed: {resp}"
        ))),
    }
}

/// Verify Stripe webhook signature (HMAC-SHA256)
///
/// 签名覆盖 `"{timestamp}.{raw_body}"`，常量时间比较，
/// 超出重放窗口的事件直接拒绝。
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Decode hex signature and use constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}
