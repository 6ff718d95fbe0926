//! Product Repository

use super::{BaseRepository, CountResult, RepoResult};
use crate::db::models::{Product, ProductCreate, ProductQuery, ProductUpdate};
use shared::time::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

/// SELECT 列表：附带创建者投影，未填充时字段为 NONE
const PRODUCT_PROJECTION: &str =
    "*, created_by.username AS created_by_username, created_by.email AS created_by_email";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Filtered, paginated listing. Returns the page and the total match count.
    ///
    /// 统计与查询共用同一 WHERE 条件，翻页数据与总数保持一致。
    pub async fn find_paged(&self, query: &ProductQuery) -> RepoResult<(Vec<Product>, u64)> {
        let mut conditions: Vec<&str> = Vec::new();

        if query.search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(name), $search) \
                 OR string::contains(string::lowercase(description), $search) \
                 OR string::contains(string::lowercase(brand), $search))",
            );
        }
        if query.category.is_some() {
            conditions.push("category = $category");
        }
        if query.brand.is_some() {
            conditions.push("brand = $brand");
        }
        if query.min_price.is_some() {
            conditions.push("price >= $min_price");
        }
        if query.max_price.is_some() {
            conditions.push("price <= $max_price");
        }
        if query.in_stock {
            conditions.push("stock > 0");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let direction = if query.sort.descending { "DESC" } else { "ASC" };
        let start = query.page.saturating_sub(1) * query.limit;

        let count_sql = format!(
            "SELECT count() AS total FROM product{} GROUP ALL",
            where_clause
        );
        let select_sql = format!(
            "SELECT {} FROM product{} ORDER BY {} {} LIMIT {} START {}",
            PRODUCT_PROJECTION,
            where_clause,
            query.sort.field.column(),
            direction,
            query.limit,
            start
        );
        let sql = format!("{}; {}", count_sql, select_sql);

        let mut qb = self.base.db().query(sql);
        if let Some(ref search) = query.search {
            qb = qb.bind(("search", search.to_lowercase()));
        }
        if let Some(category) = query.category {
            qb = qb.bind(("category", category));
        }
        if let Some(ref brand) = query.brand {
            qb = qb.bind(("brand", brand.clone()));
        }
        if let Some(min_price) = query.min_price {
            qb = qb.bind(("min_price", min_price));
        }
        if let Some(max_price) = query.max_price {
            qb = qb.bind(("max_price", max_price));
        }

        let mut result = qb.await?;
        let count: Vec<CountResult> = result.take(0)?;
        let total = count.first().map(|c| c.total).unwrap_or(0);
        let products: Vec<Product> = result.take(1)?;

        Ok((products, total))
    }

    /// Find product by id, with creator projection
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };
        let mut result = self
            .base
            .db()
            .query(format!("SELECT {} FROM $id", PRODUCT_PROJECTION))
            .bind(("id", thing))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE product SET
                    name = $name,
                    description = $description,
                    price = $price,
                    stock = $stock,
                    category = $category,
                    brand = $brand,
                    image_url = $image_url,
                    created_by = $created_by,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("name", data.name))
            .bind(("description", data.description))
            .bind(("price", data.price))
            .bind(("stock", data.stock))
            .bind(("category", data.category))
            .bind(("brand", data.brand))
            .bind(("image_url", data.image_url))
            .bind(("created_by", data.created_by))
            .bind(("created_at", now_millis()))
            .await?;

        let created: Option<Product> = result.take(0)?;
        created.ok_or_else(|| super::RepoError::Database("Failed to create product".to_string()))
    }

    /// Partial update. Returns None when the product does not exist.
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Option<Product>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $id SET
                    name = $name OR name,
                    description = $description OR description,
                    price = IF $has_price THEN $price ELSE price END,
                    stock = IF $has_stock THEN $stock ELSE stock END,
                    category = $category OR category,
                    brand = $brand OR brand,
                    image_url = $image_url OR image_url
                RETURN AFTER"#,
            )
            .bind(("id", thing))
            .bind(("name", data.name))
            .bind(("description", data.description))
            .bind(("has_price", data.price.is_some()))
            .bind(("price", data.price))
            .bind(("has_stock", data.stock.is_some()))
            .bind(("stock", data.stock))
            .bind(("category", data.category))
            .bind(("brand", data.brand))
            .bind(("image_url", data.image_url))
            .await?;

        let updated: Option<Product> = result.take(0)?;
        Ok(updated)
    }

    /// Hard delete
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(());
        };
        self.base
            .db()
            .query("DELETE $id")
            .bind(("id", thing))
            .await?;
        Ok(())
    }
}
