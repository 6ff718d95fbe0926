//! Review wire models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::product::ProductRef;
use crate::models::user::UserRef;

/// Review as served by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: String,
    pub user: UserRef,
    pub product: ProductRef,
    /// 1 to 5, whole stars
    pub rating: i64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
