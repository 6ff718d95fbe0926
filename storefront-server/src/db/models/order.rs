//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{OrderDto, OrderItemDto, PaymentDetails, ShippingAddress, UserBrief, UserRef};
use shared::time::millis_to_datetime;
use shared::{OrderStatus, PaymentMethod, PaymentStatus};
use surrealdb::RecordId;

use super::UserId;

/// Order ID type
pub type OrderId = RecordId;

/// Order model matching SurrealDB schema
///
/// 订单条目在下单时冻结商品名称与单价，后续商品改动不影响历史订单。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub items: Vec<OrderItemDto>,
    pub total_amount: Decimal,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Populated by queries that alias `user.username` / `user.email`
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

/// Create order payload (items already validated and price-frozen)
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub user: UserId,
    pub items: Vec<OrderItemDto>,
    pub total_amount: Decimal,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        let user = match o.user_name {
            Some(username) => UserRef::Brief(UserBrief {
                id: o.user.to_string(),
                username,
                email: o.user_email,
            }),
            None => UserRef::Id(o.user.to_string()),
        };

        OrderDto {
            id: o.id.to_string(),
            user,
            items: o.items,
            total_amount: o.total_amount,
            shipping_address: o.shipping_address,
            status: o.status,
            payment_method: o.payment_method,
            payment_status: o.payment_status,
            payment_details: o.payment_details,
            created_at: millis_to_datetime(o.created_at),
            updated_at: millis_to_datetime(o.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order {
            id: "order:o1".parse().unwrap(),
            user: "user:u1".parse().unwrap(),
            items: vec![OrderItemDto {
                product: "product:p1".to_string(),
                name: "iPad Pro".to_string(),
                price: Decimal::new(79999, 2),
                quantity: 2,
            }],
            total_amount: Decimal::new(159998, 2),
            shipping_address: ShippingAddress {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                postal_code: "62701".to_string(),
                country: "USA".to_string(),
            },
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::CreditCard,
            payment_status: PaymentStatus::Pending,
            payment_details: None,
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
            user_name: None,
            user_email: None,
        }
    }

    #[test]
    fn dto_uses_plain_id_when_user_not_populated() {
        let dto = OrderDto::from(sample_order());
        assert!(matches!(dto.user, UserRef::Id(ref id) if id == "user:u1"));
        assert_eq!(dto.total_amount, Decimal::new(159998, 2));
    }

    #[test]
    fn dto_uses_brief_when_user_populated() {
        let mut order = sample_order();
        order.user_name = Some("alice".to_string());
        order.user_email = Some("alice@example.com".to_string());

        let dto = OrderDto::from(order);
        match dto.user {
            UserRef::Brief(brief) => {
                assert_eq!(brief.id, "user:u1");
                assert_eq!(brief.username, "alice");
            }
            other => panic!("expected brief user, got {:?}", other),
        }
    }
}
