//! API response envelopes
//!
//! Every endpoint wraps its payload in one of these shapes:
//!
//! ```json
//! { "status": "success", "data": { "order": { ... } } }
//! { "status": "success", "results": 3, "data": { "reviews": [ ... ] } }
//! { "status": "fail", "message": "Not enough stock available for iPhone 15" }
//! ```

use serde::{Deserialize, Serialize};

use crate::models::order::PaymentDetails;
use crate::models::user::UserPublic;
use crate::types::PaymentStatus;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAIL: &str = "fail";
pub const STATUS_ERROR: &str = "error";

/// `{status, data}` envelope around a single named payload
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            data,
        }
    }
}

/// `{status, results, data}` envelope for unpaged lists
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub status: String,
    pub results: usize,
    pub data: T,
}

impl<T> ListResponse<T> {
    pub fn success(results: usize, data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            results,
            data,
        }
    }
}

/// Product listing envelope with pagination totals
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub status: String,
    pub results: usize,
    pub total_products: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub data: T,
}

impl<T> PagedResponse<T> {
    pub fn success(results: usize, total: u64, limit: u64, page: u64, data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            results,
            total_products: total,
            total_pages: total_pages(total, limit),
            current_page: page,
            data,
        }
    }
}

/// Total page count for a listing (ceiling division)
pub fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

/// Auth envelope: the token rides at the top level next to the user payload
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub status: String,
    pub token: String,
    pub data: UserPayload,
}

impl AuthResponse {
    pub fn success(token: String, user: UserPublic) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            token,
            data: UserPayload { user },
        }
    }
}

// ============================================================================
// Named payload wrappers (the API nests each resource under its own key)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct UserPayload {
    pub user: UserPublic,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductPayload<P> {
    pub product: P,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsPayload<P> {
    pub products: Vec<P>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderPayload<O> {
    pub order: O,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrdersPayload<O> {
    pub orders: Vec<O>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewPayload<R> {
    pub review: R,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewsPayload<R> {
    pub reviews: Vec<R>,
}

/// Payment intent response: the processor's client secret at the top level
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub status: String,
    pub client_secret: String,
}

/// Payload of `GET /api/payments/status/{orderId}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusPayload {
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<PaymentDetails>,
}

/// Webhook acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Error body `{status, message}`
///
/// `status` is `fail` for 4xx responses and `error` for 5xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn auth_response_wire_shape() {
        let resp = AuthResponse::success(
            "tok".into(),
            UserPublic {
                id: "user:1".into(),
                username: "alice".into(),
                email: "alice@example.com".into(),
                role: Role::Customer,
            },
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["token"], "tok");
        assert_eq!(json["data"]["user"]["username"], "alice");
        assert_eq!(json["data"]["user"]["role"], "customer");
    }

    #[test]
    fn paged_response_carries_camel_case_totals() {
        let resp = PagedResponse::success(2, 25, 10, 1, ProductsPayload::<u8> { products: vec![] });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["totalProducts"], 25);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["currentPage"], 1);
    }
}
