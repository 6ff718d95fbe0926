//! Payment Handlers
//!
//! 支付意图、支付状态查询与处理器回调。回调对签名失败返回 400 纯文本，
//! 验签通过后的任何内部错误都只记日志，响应一律 `{received: true}`，
//! 避免支付网关无谓重试。

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::OrderRepository;
use crate::stripe::{self, WebhookEvent};
use crate::utils::error::{AppError, AppResult};
use shared::response::{
    DataResponse, PaymentIntentResponse, PaymentStatusPayload, STATUS_SUCCESS, WebhookAck,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateIntentPayload {
    order_id: Option<String>,
}

/// Payment endpoints only accept ids pointing at order records
fn is_order_id(raw: &str) -> bool {
    raw.starts_with("order:") && raw.parse::<surrealdb::RecordId>().is_ok()
}

/// POST /api/payments/create-payment-intent
pub async fn create_intent(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateIntentPayload>,
) -> AppResult<Json<PaymentIntentResponse>> {
    let order_id = payload
        .order_id
        .as_deref()
        .filter(|id| is_order_id(id))
        .ok_or_else(|| AppError::Validation("Invalid order ID".to_string()))?;

    let repo = OrderRepository::new(state.db());
    let order = repo
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No order found with that ID".to_string()))?;

    // 严格本人校验：管理员也不能替别人付款
    if order.user != user.id {
        return Err(AppError::Forbidden(
            "You can only pay for your own orders".to_string(),
        ));
    }
    if order.payment_status.is_paid() {
        return Err(AppError::InvalidState(
            "This order has already been paid".to_string(),
        ));
    }

    let intent = stripe::create_payment_intent(
        &state.config.stripe_secret_key,
        order.total_amount,
        &order.id.to_string(),
        &user.id.to_string(),
    )
    .await?;

    info!(order_id = %order.id, intent_id = %intent.id, "Payment intent created");

    Ok(Json(PaymentIntentResponse {
        status: STATUS_SUCCESS.to_string(),
        client_secret: intent.client_secret,
    }))
}

/// GET /api/payments/status/{order_id}
pub async fn get_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<DataResponse<PaymentStatusPayload>>> {
    let repo = OrderRepository::new(state.db());
    let order = repo
        .find_by_id(&order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No order found with that ID".to_string()))?;

    if order.user != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "You can only check payment status for your own orders".to_string(),
        ));
    }

    Ok(Json(DataResponse::success(PaymentStatusPayload {
        payment_status: order.payment_status,
        payment_details: order.payment_details,
    })))
}

/// POST /api/payments/webhook
pub async fn webhook(State(state): State<ServerState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if let Err(err) =
        stripe::verify_webhook_signature(&body, signature, &state.config.stripe_webhook_secret)
    {
        warn!(error = err, "Webhook signature verification failed");
        return (StatusCode::BAD_REQUEST, format!("Webhook Error: {err}")).into_response();
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "Webhook payload is not valid JSON");
            return (StatusCode::BAD_REQUEST, format!("Webhook Error: {err}")).into_response();
        }
    };

    handle_event(&state, event).await;

    Json(WebhookAck { received: true }).into_response()
}

/// 验签后的事件分发。出错只记日志，绝不向网关返回失败。
async fn handle_event(state: &ServerState, event: WebhookEvent) {
    let repo = OrderRepository::new(state.db());
    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            let intent = event.data.object;
            let Some(order_id) = intent.metadata.order_id else {
                warn!(intent_id = %intent.id, "payment_intent.succeeded without orderId metadata");
                return;
            };
            match repo.mark_paid(&order_id, &intent.id).await {
                Ok(Some(order)) => {
                    info!(order_id = %order.id, transaction_id = %intent.id, "Order marked as paid");
                }
                Ok(None) => warn!(order_id = %order_id, "Webhook for unknown order"),
                Err(err) => {
                    error!(order_id = %order_id, error = %err, "Failed to record payment");
                }
            }
        }
        "payment_intent.payment_failed" => {
            let intent = event.data.object;
            let Some(order_id) = intent.metadata.order_id else {
                warn!(intent_id = %intent.id, "payment_intent.payment_failed without orderId metadata");
                return;
            };
            match repo.mark_payment_failed(&order_id).await {
                Ok(Some(order)) => info!(order_id = %order.id, "Payment failed for order"),
                Ok(None) => warn!(order_id = %order_id, "Webhook for unknown order"),
                Err(err) => {
                    error!(order_id = %order_id, error = %err, "Failed to record payment failure");
                }
            }
        }
        other => debug!(event_type = other, "Unhandled webhook event type"),
    }
}
