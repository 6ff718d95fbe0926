//! Review Repository

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::time::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{ProductId, Review, ReviewCreate, ReviewId, ReviewUpdate};

const ALREADY_REVIEWED: &str = "You have already reviewed this product";

#[derive(Clone)]
pub struct ReviewRepository {
    base: BaseRepository,
}

impl ReviewRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All reviews of one product, newest first, with reviewer username
    pub async fn find_by_product(&self, product: &ProductId) -> RepoResult<Vec<Review>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT *, user.username AS user_name FROM review \
                 WHERE product = $product ORDER BY created_at DESC",
            )
            .bind(("product", product.clone()))
            .await?;
        let reviews: Vec<Review> = result.take(0)?;
        Ok(reviews)
    }

    /// All reviews written by one user, newest first, with product name and image
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<Review>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT *, product.name AS product_name, product.image_url AS product_image \
                 FROM review WHERE user = $user ORDER BY created_at DESC",
            )
            .bind(("user", user.clone()))
            .await?;
        let reviews: Vec<Review> = result.take(0)?;
        Ok(reviews)
    }

    /// Find review by id, with reviewer username and product name
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Review>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };
        let mut result = self
            .base
            .db()
            .query(
                "SELECT *, user.username AS user_name, product.name AS product_name FROM $id",
            )
            .bind(("id", thing))
            .await?;
        let reviews: Vec<Review> = result.take(0)?;
        Ok(reviews.into_iter().next())
    }

    /// One review per user per product; used as the pre-check before create
    pub async fn find_by_user_and_product(
        &self,
        user: &RecordId,
        product: &ProductId,
    ) -> RepoResult<Option<Review>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM review WHERE user = $user AND product = $product LIMIT 1")
            .bind(("user", user.clone()))
            .bind(("product", product.clone()))
            .await?;
        let reviews: Vec<Review> = result.take(0)?;
        Ok(reviews.into_iter().next())
    }

    /// Create a review
    ///
    /// 唯一索引 (user, product) 作为并发兜底，冲突时返回与预检查相同的提示。
    pub async fn create(&self, data: ReviewCreate) -> RepoResult<Review> {
        if self
            .find_by_user_and_product(&data.user, &data.product)
            .await?
            .is_some()
        {
            return Err(RepoError::Duplicate(ALREADY_REVIEWED.to_string()));
        }

        let now = now_millis();
        let result = self
            .base
            .db()
            .query(
                r#"CREATE review SET
                    user = $user,
                    product = $product,
                    rating = $rating,
                    comment = $comment,
                    created_at = $created_at,
                    updated_at = $updated_at
                RETURN AFTER"#,
            )
            .bind(("user", data.user))
            .bind(("product", data.product))
            .bind(("rating", data.rating))
            .bind(("comment", data.comment))
            .bind(("created_at", now))
            .bind(("updated_at", now))
            .await;

        let mut result = match result {
            Ok(r) => r,
            Err(e) => return Err(map_duplicate(e.into())),
        };

        let created: Option<Review> = result.take(0).map_err(|e| map_duplicate(e.into()))?;
        created.ok_or_else(|| RepoError::Database("Failed to create review".to_string()))
    }

    /// Partial update. Returns None when the review does not exist.
    pub async fn update(&self, id: &ReviewId, data: ReviewUpdate) -> RepoResult<Option<Review>> {
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $id SET
                    rating = IF $has_rating THEN $rating ELSE rating END,
                    comment = $comment OR comment,
                    updated_at = $updated_at
                RETURN AFTER"#,
            )
            .bind(("id", id.clone()))
            .bind(("has_rating", data.rating.is_some()))
            .bind(("rating", data.rating))
            .bind(("comment", data.comment))
            .bind(("updated_at", now_millis()))
            .await?;
        let updated: Option<Review> = result.take(0)?;
        Ok(updated)
    }

    /// Hard delete
    pub async fn delete(&self, id: &ReviewId) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE $id")
            .bind(("id", id.clone()))
            .await?;
        Ok(())
    }

    /// Recompute and persist a product's rating aggregates from its current reviews.
    ///
    /// Returns `(ratings_quantity, ratings_average)` after the update.
    pub async fn recompute_product_rating(
        &self,
        product: &ProductId,
    ) -> RepoResult<(i64, f64)> {
        let mut result = self
            .base
            .db()
            .query("SELECT VALUE rating FROM review WHERE product = $product")
            .bind(("product", product.clone()))
            .await?;
        let ratings: Vec<i64> = result.take(0)?;

        let (quantity, average) = aggregate_stats(&ratings);

        self.base
            .db()
            .query(
                "UPDATE $product SET ratings_average = $average, ratings_quantity = $quantity",
            )
            .bind(("product", product.clone()))
            .bind(("average", average))
            .bind(("quantity", quantity))
            .await?;

        Ok((quantity, average))
    }
}

/// 计算评分数量与平均分（保留一位小数，四舍五入）
fn aggregate_stats(ratings: &[i64]) -> (i64, f64) {
    if ratings.is_empty() {
        return (0, 0.0);
    }
    let count = ratings.len() as i64;
    let sum: i64 = ratings.iter().sum();
    let average = (Decimal::from(sum) / Decimal::from(count)).round_dp_with_strategy(
        1,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    );
    (count, average.to_f64().unwrap_or(0.0))
}

/// 唯一索引冲突改写为统一提示，其他错误原样返回
fn map_duplicate(err: RepoError) -> RepoError {
    match err {
        RepoError::Duplicate(_) => RepoError::Duplicate(ALREADY_REVIEWED.to_string()),
        other => other,
    }
}
