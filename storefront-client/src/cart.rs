//! 购物车
//!
//! 纯客户端聚合，服务端从不感知；结账时经 [`Cart::to_order_items`]
//! 转成下单请求。可序列化，便于本地持久化。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shared::client::OrderItemRequest;
use shared::models::ProductDto;

/// 购物车条目，价格为加入时的快照 (结账时服务端按当前价重算)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
    pub image_url: String,
}

/// 购物车
///
/// 同一商品重复加入只合并数量；数量调到 0 即移除。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// 加入商品；已有同一商品则合并数量
    ///
    /// `quantity` 不为正时不做任何事。
    pub fn add(&mut self, product: &ProductDto, quantity: i64) {
        self.add_item(CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            image_url: product.image_url.clone(),
        });
    }

    /// 加入一条条目；按 product_id 合并
    pub fn add_item(&mut self, item: CartItem) {
        if item.quantity <= 0 {
            return;
        }
        match self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            Some(existing) => existing.quantity += item.quantity,
            None => self.items.push(item),
        }
    }

    /// 直接设置数量；0 或负数移除该条目
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
        }
    }

    pub fn remove(&mut self, product_id: &str) {
        self.items.retain(|i| i.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 不同商品的条目数
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 所有条目数量之和
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// 快照价合计
    pub fn total_amount(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum()
    }

    /// 结账载荷
    pub fn to_order_items(&self) -> Vec<OrderItemRequest> {
        self.items
            .iter()
            .map(|i| OrderItemRequest {
                product: i.product_id.clone(),
                quantity: i.quantity,
            })
            .collect()
    }
}
