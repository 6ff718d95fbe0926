//! Order Repository
//!
//! 下单与取消都在单个 SurrealDB 事务里完成：库存条件扣减 + 订单写入
//! 要么全部生效，要么全部回滚，超卖时通过 THROW 中止整个事务。

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{OrderItemDto, PaymentDetails, ShippingAddress};
use shared::time::now_millis;
use shared::{OrderStatus, PaymentMethod, PaymentStatus};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Order, OrderCreate};

/// SELECT 列表：附带下单用户投影
const ORDER_PROJECTION: &str = "*, user.username AS user_name, user.email AS user_email";

/// 插入用结构（不含 SurrealDB id）
#[derive(Debug, Serialize)]
struct OrderInsert {
    user: RecordId,
    items: Vec<OrderItemDto>,
    total_amount: Decimal,
    shipping_address: ShippingAddress,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    created_at: i64,
    updated_at: i64,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create an order, conditionally decrementing every item's stock in one transaction.
    ///
    /// 任何一项库存不足都会 THROW 并回滚所有已执行的扣减。
    pub async fn create(&self, data: OrderCreate) -> RepoResult<Order> {
        let stock_ops = parse_stock_ops(&data.items)?;

        let now = now_millis();
        let key = uuid::Uuid::new_v4().simple().to_string();
        let id = RecordId::from_table_key("order", key);

        let order = Order {
            id: id.clone(),
            user: data.user.clone(),
            items: data.items.clone(),
            total_amount: data.total_amount,
            shipping_address: data.shipping_address.clone(),
            status: OrderStatus::Pending,
            payment_method: data.payment_method,
            payment_status: PaymentStatus::Pending,
            payment_details: None,
            created_at: now,
            updated_at: now,
            user_name: None,
            user_email: None,
        };

        let insert = OrderInsert {
            user: data.user,
            items: data.items,
            total_amount: data.total_amount,
            shipping_address: data.shipping_address,
            status: OrderStatus::Pending,
            payment_method: data.payment_method,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for i in 0..stock_ops.len() {
            sql.push_str(&format!(
                "LET $u{i} = (UPDATE $p{i} SET stock -= $q{i} WHERE stock >= $q{i} RETURN AFTER);\n"
            ));
            sql.push_str(&format!(
                "IF array::len($u{i}) = 0 {{ THROW \"INSUFFICIENT_STOCK:{i}\" }};\n"
            ));
        }
        sql.push_str("CREATE $order_id CONTENT $content;\nCOMMIT TRANSACTION;");

        let mut qb = self
            .base
            .db()
            .query(sql)
            .bind(("order_id", id))
            .bind(("content", insert));
        for (i, (product, quantity)) in stock_ops.into_iter().enumerate() {
            qb = qb
                .bind((format!("p{i}"), product))
                .bind((format!("q{i}"), quantity));
        }

        let mut response = qb.await?;
        let errors: Vec<String> = response
            .take_errors()
            .into_values()
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(map_create_failure(&errors, &order.items));
        }

        Ok(order)
    }

    /// Cancel an order and restore every item's stock in one transaction.
    ///
    /// WHERE 状态守卫保证并发取消只会生效一次。
    pub async fn cancel(&self, order: &Order) -> RepoResult<Order> {
        let stock_ops = parse_stock_ops(&order.items)?;
        let now = now_millis();

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        sql.push_str(
            "LET $o = (UPDATE $order_id SET status = 'cancelled', updated_at = $updated_at \
             WHERE status IN ['pending', 'processing'] RETURN AFTER);\n",
        );
        sql.push_str("IF array::len($o) = 0 { THROW \"CANCEL_CONFLICT\" };\n");
        for i in 0..stock_ops.len() {
            sql.push_str(&format!("UPDATE $p{i} SET stock += $q{i};\n"));
        }
        sql.push_str("COMMIT TRANSACTION;");

        let mut qb = self
            .base
            .db()
            .query(sql)
            .bind(("order_id", order.id.clone()))
            .bind(("updated_at", now));
        for (i, (product, quantity)) in stock_ops.into_iter().enumerate() {
            qb = qb
                .bind((format!("p{i}"), product))
                .bind((format!("q{i}"), quantity));
        }

        let mut response = qb.await?;
        let errors: Vec<String> = response
            .take_errors()
            .into_values()
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            if errors.iter().any(|m| m.contains("CANCEL_CONFLICT")) {
                return Err(RepoError::Validation(
                    "Cannot cancel an order that has been shipped or delivered".to_string(),
                ));
            }
            return Err(RepoError::Database(errors.join("; ")));
        }

        let mut cancelled = order.clone();
        cancelled.status = OrderStatus::Cancelled;
        cancelled.updated_at = now;
        Ok(cancelled)
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };
        let order: Option<Order> = self.base.db().select(thing).await?;
        Ok(order)
    }

    /// Find order by id, with user projection
    pub async fn find_by_id_populated(&self, id: &str) -> RepoResult<Option<Order>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };
        let mut result = self
            .base
            .db()
            .query(format!("SELECT {} FROM $id", ORDER_PROJECTION))
            .bind(("id", thing))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// All orders of one user, newest first
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user.clone()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders)
    }

    /// All orders, newest first, with user projection
    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let mut result = self
            .base
            .db()
            .query(format!(
                "SELECT {} FROM order ORDER BY created_at DESC",
                ORDER_PROJECTION
            ))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders)
    }

    /// Set the fulfillment status. Returns None when the order does not exist.
    pub async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> RepoResult<Option<Order>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };
        let mut result = self
            .base
            .db()
            .query(format!(
                "UPDATE $id SET status = $status, updated_at = $updated_at; \
                 SELECT {} FROM $id",
                ORDER_PROJECTION
            ))
            .bind(("id", thing))
            .bind(("status", status))
            .bind(("updated_at", now_millis()))
            .await?;
        let orders: Vec<Order> = result.take(1)?;
        Ok(orders.into_iter().next())
    }

    /// Set the payment status. Returns None when the order does not exist.
    pub async fn update_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
        details: Option<PaymentDetails>,
    ) -> RepoResult<Option<Order>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };
        let mut result = self
            .base
            .db()
            .query(format!(
                "UPDATE $id SET payment_status = $payment_status, \
                 payment_details = IF $has_details THEN $details ELSE payment_details END, \
                 updated_at = $updated_at; \
                 SELECT {} FROM $id",
                ORDER_PROJECTION
            ))
            .bind(("id", thing))
            .bind(("payment_status", payment_status))
            .bind(("has_details", details.is_some()))
            .bind(("details", details))
            .bind(("updated_at", now_millis()))
            .await?;
        let orders: Vec<Order> = result.take(1)?;
        Ok(orders.into_iter().next())
    }

    /// Record a successful payment: paid + processing + transaction details.
    ///
    /// 同一笔交易重复确认是幂等的，重放 webhook 不会改变最终状态。
    pub async fn mark_paid(
        &self,
        id: &str,
        transaction_id: &str,
    ) -> RepoResult<Option<Order>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };
        let details = PaymentDetails {
            transaction_id: transaction_id.to_string(),
            payment_date: Utc::now(),
        };
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET payment_status = 'paid', status = 'processing', \
                 payment_details = $details, updated_at = $updated_at RETURN AFTER",
            )
            .bind(("id", thing))
            .bind(("details", details))
            .bind(("updated_at", now_millis()))
            .await?;
        let order: Option<Order> = result.take(0)?;
        Ok(order)
    }

    /// Record a failed payment attempt
    pub async fn mark_payment_failed(&self, id: &str) -> RepoResult<Option<Order>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET payment_status = 'failed', updated_at = $updated_at RETURN AFTER",
            )
            .bind(("id", thing))
            .bind(("updated_at", now_millis()))
            .await?;
        let order: Option<Order> = result.take(0)?;
        Ok(order)
    }
}

/// 解析每个条目的商品 RecordId 与数量
fn parse_stock_ops(items: &[OrderItemDto]) -> RepoResult<Vec<(RecordId, i64)>> {
    let mut ops = Vec::with_capacity(items.len());
    for item in items {
        let product: RecordId = item.product.parse().map_err(|_| {
            RepoError::Validation(format!("Invalid product ID: {}", item.product))
        })?;
        ops.push((product, item.quantity));
    }
    Ok(ops)
}

/// 把事务失败消息映射为领域错误
fn map_create_failure(messages: &[String], items: &[OrderItemDto]) -> RepoError {
    for msg in messages {
        if let Some(idx) = parse_insufficient_stock(msg) {
            let name = items
                .get(idx)
                .map(|i| i.name.as_str())
                .unwrap_or("this product");
            return RepoError::InsufficientStock(format!(
                "Not enough stock available for {}",
                name
            ));
        }
    }
    RepoError::Database(messages.join("; "))
}

/// 从 THROW 消息中提取条目下标，例如 "An error occurred: INSUFFICIENT_STOCK:2"
fn parse_insufficient_stock(msg: &str) -> Option<usize> {
    let rest = msg.split("INSUFFICIENT_STOCK:").nth(1)?;
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
