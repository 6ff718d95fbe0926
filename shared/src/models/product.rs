//! Product wire models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::user::UserRef;
use crate::types::ProductCategory;

/// Catalog product as served by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i64,
    pub category: ProductCategory,
    pub brand: String,
    pub image_url: String,
    /// Denormalized mean of review ratings (one decimal place)
    #[serde(default)]
    pub ratings_average: f64,
    /// Denormalized review count
    #[serde(default)]
    pub ratings_quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserRef>,
    pub created_at: DateTime<Utc>,
}

/// Minimal product projection attached to reviews
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductBrief {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Product field on reviews: bare id or projected object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProductRef {
    Brief(ProductBrief),
    Id(String),
}

impl ProductRef {
    pub fn id(&self) -> &str {
        match self {
            ProductRef::Brief(p) => &p.id,
            ProductRef::Id(id) => id,
        }
    }
}
