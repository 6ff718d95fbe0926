//! Client-side request types
//!
//! Request bodies sent by the client library. The server accepts these
//! leniently (missing fields surface as validation errors, not decode
//! errors), so the strict shapes live here where they help callers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::order::ShippingAddress;
use crate::types::{OrderStatus, PaymentMethod, PaymentStatus, ProductCategory};

// =============================================================================
// Auth
// =============================================================================

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// New catalog product (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreateRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i64,
    pub category: ProductCategory,
    pub brand: String,
    pub image_url: String,
}

/// Partial product update (admin); absent fields stay untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// One checkout line: a product record id plus the desired quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemRequest {
    pub product: String,
    pub quantity: i64,
}

/// Checkout request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// Order status transition (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdateRequest {
    pub status: OrderStatus,
}

/// Manual payment status override (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdateRequest {
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

// =============================================================================
// Payments
// =============================================================================

/// Payment intent request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    pub order_id: String,
}

// =============================================================================
// Reviews
// =============================================================================

/// New review for a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCreateRequest {
    pub rating: i64,
    pub comment: String,
}

/// Partial review update; absent fields stay untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
