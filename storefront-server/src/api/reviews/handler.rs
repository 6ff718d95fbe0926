//! Review Handlers
//!
//! 每次评价写操作 (新建、修改、删除) 之后都同步重算商品的评分聚合，
//! 删除前先留住商品 id，重算才有对象。

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use surrealdb::RecordId;
use tracing::info;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{ReviewCreate, ReviewUpdate};
use crate::db::repository::{ProductRepository, ReviewRepository};
use crate::utils::error::{AppError, AppResult};
use shared::models::ReviewDto;
use shared::response::{DataResponse, ListResponse, ReviewPayload, ReviewsPayload};

/// 评价请求体，新建与修改共用
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewBody {
    rating: Option<i64>,
    comment: Option<String>,
}

impl ReviewBody {
    /// 新建：两个字段都必填
    fn validate_create(self) -> Result<(i64, String), AppError> {
        let rating = match self.rating {
            Some(rating) if (1..=5).contains(&rating) => rating,
            _ => {
                return Err(AppError::Validation(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        };
        let comment = validate_comment(self.comment.unwrap_or_default())?;
        Ok((rating, comment))
    }

    /// 修改：只校验出现的字段
    fn validate_update(self) -> Result<ReviewUpdate, AppError> {
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::Validation(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        }
        let comment = match self.comment {
            Some(comment) => Some(validate_comment(comment)?),
            None => None,
        };
        Ok(ReviewUpdate {
            rating: self.rating,
            comment,
        })
    }
}

fn validate_comment(comment: String) -> Result<String, AppError> {
    let comment = comment.trim().to_string();
    if comment.is_empty() {
        return Err(AppError::Validation(
            "Review comment is required".to_string(),
        ));
    }
    if comment.chars().count() > 500 {
        return Err(AppError::Validation(
            "Comment cannot exceed 500 characters".to_string(),
        ));
    }
    Ok(comment)
}

// ============================================================================
// Public reads
// ============================================================================

/// GET /api/reviews/product/{product_id}
///
/// 不校验商品是否存在，未知或畸形 id 一律回空列表。
pub async fn product_reviews(
    State(state): State<ServerState>,
    Path(product_id): Path<String>,
) -> AppResult<Json<ListResponse<ReviewsPayload<ReviewDto>>>> {
    let reviews: Vec<ReviewDto> = match product_id.parse::<RecordId>() {
        Ok(product) => ReviewRepository::new(state.db())
            .find_by_product(&product)
            .await?
            .into_iter()
            .map(ReviewDto::from)
            .collect(),
        Err(_) => Vec::new(),
    };

    Ok(Json(ListResponse::success(
        reviews.len(),
        ReviewsPayload { reviews },
    )))
}

/// GET /api/reviews/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<ReviewPayload<ReviewDto>>>> {
    let repo = ReviewRepository::new(state.db());
    let review = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("No review found with that ID".to_string()))?;

    Ok(Json(DataResponse::success(ReviewPayload {
        review: ReviewDto::from(review),
    })))
}

// ============================================================================
// Authenticated operations
// ============================================================================

/// GET /api/reviews/my-reviews
pub async fn my_reviews(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ListResponse<ReviewsPayload<ReviewDto>>>> {
    let repo = ReviewRepository::new(state.db());
    let reviews: Vec<ReviewDto> = repo
        .find_by_user(&user.id)
        .await?
        .into_iter()
        .map(ReviewDto::from)
        .collect();

    Ok(Json(ListResponse::success(
        reviews.len(),
        ReviewsPayload { reviews },
    )))
}

/// POST /api/reviews/product/{product_id}
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
    Json(payload): Json<ReviewBody>,
) -> AppResult<impl IntoResponse> {
    let (rating, comment) = payload.validate_create()?;

    let products = ProductRepository::new(state.db());
    let product = products
        .find_by_id(&product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No product found with that ID".to_string()))?;

    let reviews = ReviewRepository::new(state.db());
    let review = reviews
        .create(ReviewCreate {
            user: user.id.clone(),
            product: product.id.clone(),
            rating,
            comment,
        })
        .await?;

    reviews.recompute_product_rating(&product.id).await?;

    info!(
        review_id = %review.id,
        product_id = %product.id,
        user = %user.username,
        rating,
        "Review created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::success(ReviewPayload {
            review: ReviewDto::from(review),
        })),
    ))
}

/// PATCH /api/reviews/{id}
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ReviewBody>,
) -> AppResult<Json<DataResponse<ReviewPayload<ReviewDto>>>> {
    let data = payload.validate_update()?;

    let repo = ReviewRepository::new(state.db());
    let review = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("No review found with that ID".to_string()))?;

    // 只有作者本人能改，管理员也不行
    if review.user != user.id {
        return Err(AppError::Forbidden(
            "You can only update your own reviews".to_string(),
        ));
    }

    let updated = repo
        .update(&review.id, data)
        .await?
        .ok_or_else(|| AppError::NotFound("No review found with that ID".to_string()))?;

    repo.recompute_product_rating(&review.product).await?;

    info!(review_id = %updated.id, user = %user.username, "Review updated");

    Ok(Json(DataResponse::success(ReviewPayload {
        review: ReviewDto::from(updated),
    })))
}

/// DELETE /api/reviews/{id}
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let repo = ReviewRepository::new(state.db());
    let review = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("No review found with that ID".to_string()))?;

    if review.user != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "You can only delete your own reviews".to_string(),
        ));
    }

    // 删除后评分聚合要重算，先留住商品 id
    let product_id = review.product.clone();
    repo.delete(&review.id).await?;
    repo.recompute_product_rating(&product_id).await?;

    info!(review_id = %review.id, user = %user.username, "Review deleted");

    Ok(StatusCode::NO_CONTENT)
}
