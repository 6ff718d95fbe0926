//! Product Handlers
//!
//! Public catalog reads plus admin-only catalog management

use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use validator::ValidateUrl;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{ProductCreate, ProductQuery, ProductSort, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::error::{AppError, AppResult};
use shared::ProductCategory;
use shared::models::ProductDto;
use shared::response::{DataResponse, PagedResponse, ProductPayload, ProductsPayload};

// ============================================================================
// Listing
// ============================================================================

/// 商品列表查询串
///
/// 值全部按字符串接收再转换，未知参数直接忽略，绝不落到数据库查询里。
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListQuery {
    search: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    in_stock: Option<String>,
    sort: Option<String>,
    fields: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

/// Outcome of translating the raw query string into a typed filter
enum ListFilter {
    Query(Box<ProductQuery>),
    /// 过滤值不可能命中任何商品 (未知分类、非数字价格)，直接返回空页
    Empty { page: u64, limit: u64 },
}

impl ListQuery {
    fn into_filter(self) -> ListFilter {
        let page = self
            .page
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = self
            .limit
            .and_then(|l| l.trim().parse::<u64>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(10);

        let mut query = ProductQuery {
            page,
            limit,
            ..ProductQuery::default()
        };

        if let Some(search) = self.search {
            let search = search.trim();
            if !search.is_empty() {
                query.search = Some(search.to_string());
            }
        }
        if let Some(raw) = self.category {
            match ProductCategory::parse_str(raw.trim()) {
                Some(category) => query.category = Some(category),
                None => return ListFilter::Empty { page, limit },
            }
        }
        if let Some(brand) = self.brand {
            let brand = brand.trim();
            if !brand.is_empty() {
                query.brand = Some(brand.to_string());
            }
        }
        if let Some(raw) = self.min_price {
            match raw.trim().parse::<Decimal>() {
                Ok(price) => query.min_price = Some(price),
                Err(_) => return ListFilter::Empty { page, limit },
            }
        }
        if let Some(raw) = self.max_price {
            match raw.trim().parse::<Decimal>() {
                Ok(price) => query.max_price = Some(price),
                Err(_) => return ListFilter::Empty { page, limit },
            }
        }
        query.in_stock = self.in_stock.as_deref() == Some("true");
        if let Some(raw) = self.sort {
            if let Some(sort) = ProductSort::parse(raw.trim()) {
                query.sort = sort;
            }
        }

        ListFilter::Query(Box::new(query))
    }
}

/// Apply a `fields=` projection: keep only the named keys. `id` always stays.
fn prune_fields(value: &mut serde_json::Value, fields: &str) {
    let keep: HashSet<&str> = fields
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.starts_with('-'))
        .collect();
    if keep.is_empty() {
        return;
    }
    if let serde_json::Value::Object(map) = value {
        map.retain(|key, _| key == "id" || keep.contains(key.as_str()));
    }
}

/// GET /api/products
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<PagedResponse<ProductsPayload<serde_json::Value>>>> {
    let fields = params.fields.clone();

    let filter = match params.into_filter() {
        ListFilter::Query(filter) => filter,
        ListFilter::Empty { page, limit } => {
            return Ok(Json(PagedResponse::success(
                0,
                0,
                limit,
                page,
                ProductsPayload {
                    products: Vec::new(),
                },
            )));
        }
    };

    let repo = ProductRepository::new(state.db());
    let (products, total) = repo.find_paged(&filter).await?;

    let mut values = Vec::with_capacity(products.len());
    for product in products {
        let mut value = serde_json::to_value(ProductDto::from(product))
            .map_err(|e| AppError::Internal(e.to_string()))?;
        if let Some(ref fields) = fields {
            prune_fields(&mut value, fields);
        }
        values.push(value);
    }

    let results = values.len();
    Ok(Json(PagedResponse::success(
        results,
        total,
        filter.limit,
        filter.page,
        ProductsPayload { products: values },
    )))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<ProductPayload<ProductDto>>>> {
    let repo = ProductRepository::new(state.db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("No product found with that ID".to_string()))?;

    Ok(Json(DataResponse::success(ProductPayload {
        product: ProductDto::from(product),
    })))
}

// ============================================================================
// Management (admin)
// ============================================================================

/// 创建商品请求体，约束按声明顺序检查
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    stock: Option<i64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl CreateProductPayload {
    fn validate(self) -> Result<ValidatedProduct, AppError> {
        let name = self.name.unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Product name is required".to_string()));
        }
        if name.chars().count() > 100 {
            return Err(AppError::Validation(
                "Product name cannot exceed 100 characters".to_string(),
            ));
        }

        let description = self.description.unwrap_or_default().trim().to_string();
        if description.is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }
        if description.chars().count() > 1000 {
            return Err(AppError::Validation(
                "Description cannot exceed 1000 characters".to_string(),
            ));
        }

        let price = match self.price {
            Some(price) if price > Decimal::ZERO => price,
            _ => {
                return Err(AppError::Validation(
                    "Price must be greater than 0".to_string(),
                ));
            }
        };

        let stock = match self.stock {
            Some(stock) if stock >= 0 => stock,
            _ => {
                return Err(AppError::Validation(
                    "Stock cannot be negative".to_string(),
                ));
            }
        };

        let category = self
            .category
            .as_deref()
            .and_then(|c| ProductCategory::parse_str(c.trim()))
            .ok_or_else(|| AppError::Validation("Invalid category".to_string()))?;

        let brand = self.brand.unwrap_or_default().trim().to_string();
        if brand.is_empty() {
            return Err(AppError::Validation("Brand is required".to_string()));
        }
        if brand.chars().count() > 50 {
            return Err(AppError::Validation(
                "Brand cannot exceed 50 characters".to_string(),
            ));
        }

        let image_url = self.image_url.unwrap_or_default().trim().to_string();
        if image_url.is_empty() {
            return Err(AppError::Validation("Image URL is required".to_string()));
        }
        if !image_url.validate_url() {
            return Err(AppError::Validation(
                "Please provide a valid image URL".to_string(),
            ));
        }

        Ok(ValidatedProduct {
            name,
            description,
            price,
            stock,
            category,
            brand,
            image_url,
        })
    }
}

#[derive(Debug)]
struct ValidatedProduct {
    name: String,
    description: String,
    price: Decimal,
    stock: i64,
    category: ProductCategory,
    brand: String,
    image_url: String,
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateProductPayload>,
) -> AppResult<impl IntoResponse> {
    let data = payload.validate()?;

    let repo = ProductRepository::new(state.db());
    let product = repo
        .create(ProductCreate {
            name: data.name,
            description: data.description,
            price: data.price,
            stock: data.stock,
            category: data.category,
            brand: data.brand,
            image_url: data.image_url,
            created_by: Some(user.id.clone()),
        })
        .await?;

    info!(
        product_id = %product.id,
        name = %product.name,
        created_by = %user.username,
        "Product created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::success(ProductPayload {
            product: ProductDto::from(product),
        })),
    ))
}

/// 更新商品请求体
///
/// 所有字段可选。价格与库存照建档规则约束，其余字段只做长度与枚举检查。
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProductPayload {
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    stock: Option<i64>,
    category: Option<String>,
    brand: Option<String>,
    image_url: Option<String>,
}

impl UpdateProductPayload {
    fn validate(self) -> Result<ProductUpdate, AppError> {
        if let Some(price) = self.price {
            if price <= Decimal::ZERO {
                return Err(AppError::Validation(
                    "Price must be greater than 0".to_string(),
                ));
            }
        }
        if let Some(stock) = self.stock {
            if stock < 0 {
                return Err(AppError::Validation(
                    "Stock cannot be negative".to_string(),
                ));
            }
        }

        let mut update = ProductUpdate {
            price: self.price,
            stock: self.stock,
            ..ProductUpdate::default()
        };

        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::Validation("Product name is required".to_string()));
            }
            if name.chars().count() > 100 {
                return Err(AppError::Validation(
                    "Product name cannot exceed 100 characters".to_string(),
                ));
            }
            update.name = Some(name);
        }
        if let Some(description) = self.description {
            let description = description.trim().to_string();
            if description.is_empty() {
                return Err(AppError::Validation("Description is required".to_string()));
            }
            if description.chars().count() > 1000 {
                return Err(AppError::Validation(
                    "Description cannot exceed 1000 characters".to_string(),
                ));
            }
            update.description = Some(description);
        }
        if let Some(raw) = self.category {
            let category = ProductCategory::parse_str(raw.trim())
                .ok_or_else(|| AppError::Validation("Invalid category".to_string()))?;
            update.category = Some(category);
        }
        if let Some(brand) = self.brand {
            let brand = brand.trim().to_string();
            if brand.is_empty() {
                return Err(AppError::Validation("Brand is required".to_string()));
            }
            if brand.chars().count() > 50 {
                return Err(AppError::Validation(
                    "Brand cannot exceed 50 characters".to_string(),
                ));
            }
            update.brand = Some(brand);
        }
        if let Some(image_url) = self.image_url {
            let image_url = image_url.trim().to_string();
            if image_url.is_empty() {
                return Err(AppError::Validation("Image URL is required".to_string()));
            }
            update.image_url = Some(image_url);
        }

        Ok(update)
    }
}

/// PATCH /api/products/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductPayload>,
) -> AppResult<Json<DataResponse<ProductPayload<ProductDto>>>> {
    let data = payload.validate()?;

    let repo = ProductRepository::new(state.db());
    let product = repo
        .update(&id, data)
        .await?
        .ok_or_else(|| AppError::NotFound("No product found with that ID".to_string()))?;

    info!(product_id = %product.id, "Product updated");

    Ok(Json(DataResponse::success(ProductPayload {
        product: ProductDto::from(product),
    })))
}

/// DELETE /api/products/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let repo = ProductRepository::new(state.db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("No product found with that ID".to_string()))?;

    repo.delete(&id).await?;
    info!(product_id = %product.id, name = %product.name, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}
