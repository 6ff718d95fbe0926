//! 订单通知服务
//!
//! 通过 HTTP 网关投递订单相关通知 (下单确认、状态变更、支付确认)。
//! 通知失败只记录日志，绝不让订单请求因此失败。

use serde::Serialize;

use crate::db::models::Order;
use shared::OrderStatus;

/// 投递给通知网关的消息体
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notification gateway client
///
/// 网关地址未配置时所有发送都是空操作 (开发环境常态)。
#[derive(Clone, Debug)]
pub struct NotificationService {
    gateway_url: Option<String>,
    from: String,
    client: reqwest::Client,
}

impl NotificationService {
    pub fn new(gateway_url: Option<String>, from: String) -> Self {
        Self {
            gateway_url,
            from,
            client: reqwest::Client::new(),
        }
    }

    /// 下单确认
    pub async fn send_order_confirmation(&self, email: &str, username: &str, order: &Order) {
        let message = self.order_confirmation(email, username, order);
        self.deliver(message).await;
    }

    /// 订单状态变更
    pub async fn send_order_status_update(&self, email: &str, username: &str, order: &Order) {
        let message = self.order_status_update(email, username, order);
        self.deliver(message).await;
    }

    /// 支付确认
    pub async fn send_payment_confirmation(&self, email: &str, username: &str, order: &Order) {
        let message = self.payment_confirmation(email, username, order);
        self.deliver(message).await;
    }

    fn order_confirmation(&self, email: &str, username: &str, order: &Order) -> NotificationMessage {
        NotificationMessage {
            from: self.from.clone(),
            to: email.to_string(),
            subject: format!("Order Confirmation - Order #{}", order.id),
            body: format!(
                "Hello {username},\n\
                 Thank you for your order! Your order has been received and is being processed.\n\
                 Order ID: {}\n\
                 Order Status: {}\n\
                 Payment Method: {}\n\
                 Total: ${}",
                order.id, order.status, order.payment_method, order.total_amount
            ),
        }
    }

    fn order_status_update(&self, email: &str, username: &str, order: &Order) -> NotificationMessage {
        NotificationMessage {
            from: self.from.clone(),
            to: email.to_string(),
            subject: format!("Order Status Update - Order #{}", order.id),
            body: format!(
                "Hello {username},\n{}",
                status_message(order.status)
            ),
        }
    }

    fn payment_confirmation(&self, email: &str, username: &str, order: &Order) -> NotificationMessage {
        let transaction_id = order
            .payment_details
            .as_ref()
            .map(|d| d.transaction_id.clone())
            .unwrap_or_else(|| "N/A".to_string());

        NotificationMessage {
            from: self.from.clone(),
            to: email.to_string(),
            subject: format!("Payment Confirmation - Order #{}", order.id),
            body: format!(
                "Hello {username},\n\
                 We have received your payment. Thank you!\n\
                 Order ID: {}\n\
                 Transaction ID: {transaction_id}\n\
                 Amount: ${}",
                order.id, order.total_amount
            ),
        }
    }

    /// 投递到网关，失败只告警
    async fn deliver(&self, message: NotificationMessage) {
        let Some(url) = &self.gateway_url else {
            tracing::debug!(
                to = %message.to,
                subject = %message.subject,
                "Notification gateway not configured, skipping delivery"
            );
            return;
        };

        let result = self.client.post(url).json(&message).send().await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(to = %message.to, subject = %message.subject, "Notification delivered");
            }
            Ok(resp) => {
                tracing::warn!(
                    to = %message.to,
                    status = %resp.status(),
                    "Notification gateway rejected message"
                );
            }
            Err(e) => {
                tracing::warn!(to = %message.to, error = %e, "Failed to deliver notification");
            }
        }
    }
}

/// 状态对应的通知文案
fn status_message(status: OrderStatus) -> String {
    match status {
        OrderStatus::Processing => "Your order is now being processed.".to_string(),
        OrderStatus::Shipped => {
            "Your order has been shipped and is on its way to you!".to_string()
        }
        OrderStatus::Delivered => {
            "Your order has been delivered. We hope you enjoy your purchase!".to_string()
        }
        OrderStatus::Cancelled => "Your order has been cancelled.".to_string(),
        other => format!("Your order status has been updated to: {other}"),
    }
}
