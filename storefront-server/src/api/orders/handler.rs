//! Order Handlers
//!
//! 下单走"控制器预检 + 事务条件扣减"两层：预检给出准确的错误消息，
//! 事务保证并发下永不超卖。

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::OrderCreate;
use crate::db::repository::{OrderRepository, ProductRepository};
use crate::utils::error::{AppError, AppResult};
use shared::models::{OrderDto, OrderItemDto, PaymentDetails, ShippingAddress};
use shared::response::{DataResponse, ListResponse, OrderPayload, OrdersPayload};
use shared::{OrderStatus, PaymentStatus};

// ============================================================================
// Create
// ============================================================================

/// 下单请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateOrderPayload {
    items: Option<Vec<OrderItemPayload>>,
    shipping_address: Option<AddressPayload>,
    payment_method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrderItemPayload {
    product: Option<String>,
    quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AddressPayload {
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
}

#[derive(Debug)]
struct ValidatedOrder {
    /// (product id, quantity) 对，名称与单价在商品查询后冻结
    items: Vec<(String, i64)>,
    shipping_address: ShippingAddress,
    payment_method: shared::PaymentMethod,
}

/// Order item ids must point at product records
fn is_product_id(raw: &str) -> bool {
    raw.starts_with("product:") && raw.parse::<surrealdb::RecordId>().is_ok()
}

impl CreateOrderPayload {
    fn validate(self) -> Result<ValidatedOrder, AppError> {
        let items = self.items.unwrap_or_default();
        if items.is_empty() {
            return Err(AppError::Validation(
                "Order must contain at least one item".to_string(),
            ));
        }
        for item in &items {
            let valid = item.product.as_deref().is_some_and(is_product_id);
            if !valid {
                return Err(AppError::Validation("Invalid product ID".to_string()));
            }
        }
        for item in &items {
            if item.quantity.unwrap_or(0) < 1 {
                return Err(AppError::Validation(
                    "Quantity must be at least 1".to_string(),
                ));
            }
        }

        let address = self.shipping_address.unwrap_or_default();
        let street = required_field(address.street, "Street is required")?;
        let city = required_field(address.city, "City is required")?;
        let state = required_field(address.state, "State is required")?;
        let postal_code = required_field(address.postal_code, "Postal code is required")?;
        let country = required_field(address.country, "Country is required")?;

        let payment_method = self
            .payment_method
            .as_deref()
            .and_then(shared::PaymentMethod::parse_str)
            .ok_or_else(|| AppError::Validation("Invalid payment method".to_string()))?;

        Ok(ValidatedOrder {
            items: items
                .into_iter()
                .map(|i| (i.product.unwrap_or_default(), i.quantity.unwrap_or(0)))
                .collect(),
            shipping_address: ShippingAddress {
                street,
                city,
                state,
                postal_code,
                country,
            },
            payment_method,
        })
    }
}

fn required_field(value: Option<String>, message: &str) -> Result<String, AppError> {
    let value = value.unwrap_or_default().trim().to_string();
    if value.is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(value)
}

/// POST /api/orders
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderPayload>,
) -> AppResult<impl IntoResponse> {
    let data = payload.validate()?;

    let products = ProductRepository::new(state.db());
    let mut items = Vec::with_capacity(data.items.len());
    let mut total = Decimal::ZERO;
    for (product_id, quantity) in data.items {
        let product = products.find_by_id(&product_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Product with ID {} not found", product_id))
        })?;
        if product.stock < quantity {
            return Err(AppError::InsufficientStock(format!(
                "Not enough stock available for {}",
                product.name
            )));
        }
        total += product.price * Decimal::from(quantity);
        items.push(OrderItemDto {
            product: product.id.to_string(),
            name: product.name,
            price: product.price,
            quantity,
        });
    }

    let orders = OrderRepository::new(state.db());
    let order = orders
        .create(OrderCreate {
            user: user.id.clone(),
            items,
            total_amount: total,
            shipping_address: data.shipping_address,
            payment_method: data.payment_method,
        })
        .await?;

    info!(
        order_id = %order.id,
        user = %user.username,
        total = %order.total_amount,
        "Order placed"
    );

    state
        .notify
        .send_order_confirmation(&user.email, &user.username, &order)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::success(OrderPayload {
            order: OrderDto::from(order),
        })),
    ))
}

// ============================================================================
// Reads
// ============================================================================

/// GET /api/orders/my-orders
pub async fn my_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ListResponse<OrdersPayload<OrderDto>>>> {
    let repo = OrderRepository::new(state.db());
    let orders: Vec<OrderDto> = repo
        .find_by_user(&user.id)
        .await?
        .into_iter()
        .map(OrderDto::from)
        .collect();

    Ok(Json(ListResponse::success(
        orders.len(),
        OrdersPayload { orders },
    )))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<OrderPayload<OrderDto>>>> {
    let repo = OrderRepository::new(state.db());
    let order = repo
        .find_by_id_populated(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("No order found with that ID".to_string()))?;

    if order.user != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "You do not have permission to view this order".to_string(),
        ));
    }

    Ok(Json(DataResponse::success(OrderPayload {
        order: OrderDto::from(order),
    })))
}

/// GET /api/orders (admin)
pub async fn list_all(
    State(state): State<ServerState>,
) -> AppResult<Json<ListResponse<OrdersPayload<OrderDto>>>> {
    let repo = OrderRepository::new(state.db());
    let orders: Vec<OrderDto> = repo
        .find_all()
        .await?
        .into_iter()
        .map(OrderDto::from)
        .collect();

    Ok(Json(ListResponse::success(
        orders.len(),
        OrdersPayload { orders },
    )))
}

// ============================================================================
// Cancellation
// ============================================================================

/// PATCH /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<OrderPayload<OrderDto>>>> {
    let repo = OrderRepository::new(state.db());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("No order found with that ID".to_string()))?;

    if order.user != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "You do not have permission to cancel this order".to_string(),
        ));
    }
    if !order.status.can_cancel() {
        return Err(AppError::InvalidState(
            "Cannot cancel an order that has been shipped or delivered".to_string(),
        ));
    }

    let cancelled = repo.cancel(&order).await?;
    info!(order_id = %cancelled.id, user = %user.username, "Order cancelled");

    Ok(Json(DataResponse::success(OrderPayload {
        order: OrderDto::from(cancelled),
    })))
}

// ============================================================================
// Admin status transitions
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStatusPayload {
    status: Option<String>,
}

/// PATCH /api/orders/{id}/status (admin)
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusPayload>,
) -> AppResult<Json<DataResponse<OrderPayload<OrderDto>>>> {
    let status = payload
        .status
        .as_deref()
        .and_then(OrderStatus::parse_str)
        .ok_or_else(|| AppError::Validation("Invalid order status".to_string()))?;

    let repo = OrderRepository::new(state.db());
    let order = repo
        .update_status(&id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("No order found with that ID".to_string()))?;

    info!(order_id = %order.id, status = %status, "Order status updated");

    // 下单用户还在时通知状态变更
    if let (Some(email), Some(username)) = (order.user_email.as_deref(), order.user_name.as_deref())
    {
        state
            .notify
            .send_order_status_update(email, username, &order)
            .await;
    }

    Ok(Json(DataResponse::success(OrderPayload {
        order: OrderDto::from(order),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePaymentPayload {
    payment_status: Option<String>,
    transaction_id: Option<String>,
}

/// PATCH /api/orders/{id}/payment (admin)
pub async fn update_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePaymentPayload>,
) -> AppResult<Json<DataResponse<OrderPayload<OrderDto>>>> {
    let status = payload
        .payment_status
        .as_deref()
        .and_then(PaymentStatus::parse_str)
        .ok_or_else(|| AppError::Validation("Invalid payment status".to_string()))?;

    let details = payload
        .transaction_id
        .filter(|t| !t.is_empty())
        .map(|transaction_id| PaymentDetails {
            transaction_id,
            payment_date: Utc::now(),
        });

    let repo = OrderRepository::new(state.db());
    let order = repo
        .update_payment_status(&id, status, details)
        .await?
        .ok_or_else(|| AppError::NotFound("No order found with that ID".to_string()))?;

    info!(order_id = %order.id, payment_status = %status, "Payment status updated");

    if status.is_paid() {
        if let (Some(email), Some(username)) =
            (order.user_email.as_deref(), order.user_name.as_deref())
        {
            state
                .notify
                .send_payment_confirmation(email, username, &order)
                .await;
        }
    }

    Ok(Json(DataResponse::success(OrderPayload {
        order: OrderDto::from(order),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_payload() -> CreateOrderPayload {
        CreateOrderPayload {
            items: Some(vec![OrderItemPayload {
                product: Some("product:p1".to_string()),
                quantity: Some(2),
            }]),
            shipping_address: Some(AddressPayload {
                street: Some("1 Main St".to_string()),
                city: Some("Springfield".to_string()),
                state: Some("IL".to_string()),
                postal_code: Some("62701".to_string()),
                country: Some("USA".to_string()),
            }),
            payment_method: Some("credit_card".to_string()),
        }
    }

    fn first_message(payload: CreateOrderPayload) -> String {
        match payload.validate() {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn create_order_validation_runs_in_declared_order() {
        assert_eq!(
            first_message(CreateOrderPayload::default()),
            "Order must contain at least one item"
        );

        let bad_product = CreateOrderPayload {
            items: Some(vec![OrderItemPayload {
                product: Some("user:u1".to_string()),
                quantity: Some(1),
            }]),
            ..full_payload()
        };
        assert_eq!(first_message(bad_product), "Invalid product ID");

        let zero_quantity = CreateOrderPayload {
            items: Some(vec![OrderItemPayload {
                product: Some("product:p1".to_string()),
                quantity: Some(0),
            }]),
            ..full_payload()
        };
        assert_eq!(first_message(zero_quantity), "Quantity must be at least 1");

        let missing_address = CreateOrderPayload {
            shipping_address: None,
            ..full_payload()
        };
        assert_eq!(first_message(missing_address), "Street is required");

        let bad_method = CreateOrderPayload {
            payment_method: Some("bitcoin".to_string()),
            ..full_payload()
        };
        assert_eq!(first_message(bad_method), "Invalid payment method");

        assert!(full_payload().validate().is_ok());
    }

    #[test]
    fn item_errors_check_every_product_before_quantities() {
        // 第二个条目的 product 非法、第一个条目的数量非法：product 检查先报
        let payload = CreateOrderPayload {
            items: Some(vec![
                OrderItemPayload {
                    product: Some("product:p1".to_string()),
                    quantity: Some(0),
                },
                OrderItemPayload {
                    product: Some("not-a-record".to_string()),
                    quantity: Some(1),
                },
            ]),
            ..full_payload()
        };
        assert_eq!(first_message(payload), "Invalid product ID");
    }

    #[test]
    fn address_fields_are_trimmed() {
        let padded = CreateOrderPayload {
            shipping_address: Some(AddressPayload {
                street: Some("  1 Main St  ".to_string()),
                city: Some("Springfield".to_string()),
                state: Some("IL".to_string()),
                postal_code: Some("62701".to_string()),
                country: Some("   ".to_string()),
            }),
            ..full_payload()
        };
        assert_eq!(first_message(padded), "Country is required");

        let mut payload = full_payload();
        payload.shipping_address.as_mut().unwrap().street = Some("  1 Main St  ".to_string());
        let data = payload.validate().unwrap();
        assert_eq!(data.shipping_address.street, "1 Main St");
    }
}
