//! Review Model

use serde::{Deserialize, Serialize};
use shared::models::{ProductBrief, ProductRef, ReviewDto, UserBrief, UserRef};
use shared::time::millis_to_datetime;
use surrealdb::RecordId;

use super::{ProductId, UserId};

/// Review ID type
pub type ReviewId = RecordId;

/// Review model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user: UserId,
    pub product: ProductId,
    /// 整星评分，1 到 5
    pub rating: i64,
    pub comment: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Populated by queries that alias related record fields
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
}

/// Create review payload
#[derive(Debug, Clone)]
pub struct ReviewCreate {
    pub user: UserId,
    pub product: ProductId,
    pub rating: i64,
    pub comment: String,
}

/// Update review payload (partial)
#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl From<Review> for ReviewDto {
    fn from(r: Review) -> Self {
        let user = match r.user_name {
            Some(username) => UserRef::Brief(UserBrief {
                id: r.user.to_string(),
                username,
                email: None,
            }),
            None => UserRef::Id(r.user.to_string()),
        };
        let product = match r.product_name {
            Some(name) => ProductRef::Brief(ProductBrief {
                id: r.product.to_string(),
                name,
                image_url: r.product_image,
            }),
            None => ProductRef::Id(r.product.to_string()),
        };

        ReviewDto {
            id: r.id.to_string(),
            user,
            product,
            rating: r.rating,
            comment: r.comment,
            created_at: millis_to_datetime(r.created_at),
            updated_at: millis_to_datetime(r.updated_at),
        }
    }
}
