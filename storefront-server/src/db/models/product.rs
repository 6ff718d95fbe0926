//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::ProductCategory;
use shared::models::{ProductDto, UserBrief, UserRef};
use shared::time::millis_to_datetime;
use surrealdb::RecordId;

use super::UserId;

/// Product ID type
pub type ProductId = RecordId;

/// Product model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i64,
    pub category: ProductCategory,
    pub brand: String,
    pub image_url: String,
    #[serde(default)]
    pub ratings_average: f64,
    #[serde(default)]
    pub ratings_quantity: i64,
    pub created_by: Option<UserId>,
    pub created_at: i64,
    /// Populated by queries that alias `created_by.username` / `created_by.email`
    #[serde(default)]
    pub created_by_username: Option<String>,
    #[serde(default)]
    pub created_by_email: Option<String>,
}

/// Create product payload
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i64,
    pub category: ProductCategory,
    pub brand: String,
    pub image_url: String,
    pub created_by: Option<UserId>,
}

/// Update product payload (partial, absent fields keep their value)
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub category: Option<ProductCategory>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
}

/// Product listing filter (all conditions AND-combined)
#[derive(Debug, Clone)]
pub struct ProductQuery {
    /// Case-insensitive substring match on name, description and brand
    pub search: Option<String>,
    pub category: Option<ProductCategory>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Only include products with stock > 0
    pub in_stock: bool,
    pub sort: ProductSort,
    pub page: u64,
    pub limit: u64,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            brand: None,
            min_price: None,
            max_price: None,
            in_stock: false,
            sort: ProductSort::default(),
            page: 1,
            limit: 10,
        }
    }
}

/// Sort order for product listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSort {
    pub field: SortField,
    pub descending: bool,
}

impl Default for ProductSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl ProductSort {
    /// Parse a wire sort expression, e.g. `price` or `-createdAt`.
    ///
    /// 未知字段返回 None，由调用方回退到默认排序。
    pub fn parse(raw: &str) -> Option<Self> {
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let field = match name {
            "name" => SortField::Name,
            "price" => SortField::Price,
            "stock" => SortField::Stock,
            "ratingsAverage" => SortField::RatingsAverage,
            "createdAt" => SortField::CreatedAt,
            _ => return None,
        };
        Some(Self { field, descending })
    }
}

/// Whitelisted sort columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Price,
    Stock,
    RatingsAverage,
    CreatedAt,
}

impl SortField {
    /// Database column name
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::Stock => "stock",
            SortField::RatingsAverage => "ratings_average",
            SortField::CreatedAt => "created_at",
        }
    }
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        let created_by = match (&p.created_by, p.created_by_username) {
            (Some(id), Some(username)) => Some(UserRef::Brief(UserBrief {
                id: id.to_string(),
                username,
                email: p.created_by_email,
            })),
            (Some(id), None) => Some(UserRef::Id(id.to_string())),
            (None, _) => None,
        };

        ProductDto {
            id: p.id.to_string(),
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            category: p.category,
            brand: p.brand,
            image_url: p.image_url,
            ratings_average: p.ratings_average,
            ratings_quantity: p.ratings_quantity,
            created_by,
            created_at: millis_to_datetime(p.created_at),
        }
    }
}
