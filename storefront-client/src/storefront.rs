//! Storefront API client
//!
//! 所有 REST 端点的类型化封装。令牌保存在 [`Session`] 里，每次请求
//! 自动携带；服务端返回 401/403 时会话立即失效。

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::cart::Cart;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::{HttpClient, NetworkHttpClient};
use crate::session::Session;
use shared::client::{
    LoginRequest, OrderCreateRequest, OrderStatusUpdateRequest, PaymentIntentRequest,
    PaymentUpdateRequest, ProductCreateRequest, ProductUpdateRequest, RegisterRequest,
    ReviewCreateRequest, ReviewUpdateRequest,
};
use shared::models::{OrderDto, ProductDto, ReviewDto, ShippingAddress, UserPublic};
use shared::response::{
    AuthResponse, DataResponse, ListResponse, OrderPayload, OrdersPayload, PagedResponse,
    PaymentIntentResponse, PaymentStatusPayload, ProductPayload, ProductsPayload, ReviewPayload,
    ReviewsPayload,
};
use shared::types::{OrderStatus, PaymentMethod, PaymentStatus, ProductCategory};

// ============================================================================
// Catalog query builder
// ============================================================================

/// 商品列表过滤条件
///
/// 只携带显式设置的参数；服务端忽略未知值时返回空页而不是报错。
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    search: Option<String>,
    category: Option<ProductCategory>,
    brand: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    in_stock: bool,
    sort: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 名称/描述/品牌上的模糊搜索
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn category(mut self, category: ProductCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn min_price(mut self, price: Decimal) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: Decimal) -> Self {
        self.max_price = Some(price);
        self
    }

    /// 只要有货的商品
    pub fn in_stock_only(mut self) -> Self {
        self.in_stock = true;
        self
    }

    /// 排序键，如 `price`、`-price`、`name`；未知键服务端按默认排序
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref search) = self.search {
            params.push(("search", search.clone()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.as_str().to_string()));
        }
        if let Some(ref brand) = self.brand {
            params.push(("brand", brand.clone()));
        }
        if let Some(min_price) = self.min_price {
            params.push(("minPrice", min_price.to_string()));
        }
        if let Some(max_price) = self.max_price {
            params.push(("maxPrice", max_price.to_string()));
        }
        if self.in_stock {
            params.push(("inStock", "true".to_string()));
        }
        if let Some(ref sort) = self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

/// 一页商品列表
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<ProductDto>,
    pub total_products: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl From<PagedResponse<ProductsPayload<ProductDto>>> for ProductPage {
    fn from(resp: PagedResponse<ProductsPayload<ProductDto>>) -> Self {
        Self {
            products: resp.data.products,
            total_products: resp.total_products,
            total_pages: resp.total_pages,
            current_page: resp.current_page,
        }
    }
}

/// `GET /health` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Client
// ============================================================================

/// Storefront API 客户端
///
/// 泛型于传输层，测试可注入假传输；默认用 [`NetworkHttpClient`]。
pub struct StorefrontClient<C: HttpClient = NetworkHttpClient> {
    http: C,
    session: Session,
}

impl StorefrontClient<NetworkHttpClient> {
    /// 连接服务端，会话只存内存
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            http: NetworkHttpClient::new(base_url)?,
            session: Session::in_memory(),
        })
    }

    /// 带自定义会话 (如文件持久化) 连接
    pub fn with_session(base_url: &str, session: Session) -> ClientResult<Self> {
        Ok(Self {
            http: NetworkHttpClient::new(base_url)?,
            session,
        })
    }

    pub fn from_config(config: &ClientConfig, session: Session) -> ClientResult<Self> {
        Ok(Self {
            http: NetworkHttpClient::from_config(config)?,
            session,
        })
    }
}

impl<C: HttpClient> StorefrontClient<C> {
    /// 自装配传输层与会话
    pub fn from_parts(http: C, session: Session) -> Self {
        Self { http, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ------------------------------------------------------------------
    // Transport shims: 携带会话令牌，401/403 使会话失效
    // ------------------------------------------------------------------

    fn guard<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result {
            if err.is_auth_rejection() {
                self.session.invalidate();
            }
        }
        result
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let bearer = self.session.token();
        let result = self.http.get(path, bearer.as_deref()).await;
        self.guard(result)
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let bearer = self.session.token();
        let result = self.http.get_with_query(path, query, bearer.as_deref()).await;
        self.guard(result)
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let bearer = self.session.token();
        let result = self.http.post(path, body, bearer.as_deref()).await;
        self.guard(result)
    }

    async fn patch<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let bearer = self.session.token();
        let result = self.http.patch(path, body, bearer.as_deref()).await;
        self.guard(result)
    }

    async fn patch_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let bearer = self.session.token();
        let result = self.http.patch_empty(path, bearer.as_deref()).await;
        self.guard(result)
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        let bearer = self.session.token();
        let result = self.http.delete(path, bearer.as_deref()).await;
        self.guard(result)
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// Register a customer account; logs the session in on success
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<UserPublic> {
        let req = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.http.post("/api/auth/register", &req, None).await?;
        self.session.open(&resp.token, resp.data.user.clone())?;
        Ok(resp.data.user)
    }

    /// Login with email and password
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserPublic> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.http.post("/api/auth/login", &req, None).await?;
        self.session.open(&resp.token, resp.data.user.clone())?;
        Ok(resp.data.user)
    }

    /// Get current user information
    pub async fn me(&self) -> ClientResult<UserPublic> {
        let resp: DataResponse<shared::response::UserPayload> = self.get("/api/auth/me").await?;
        Ok(resp.data.user)
    }

    /// 客户端登出：清会话与定时器，服务端无会话状态
    pub fn logout(&self) -> ClientResult<()> {
        self.session.close()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    /// List catalog products with filtering and pagination
    pub async fn list_products(&self, query: &ProductQuery) -> ClientResult<ProductPage> {
        let params = query.to_params();
        let resp: PagedResponse<ProductsPayload<ProductDto>> =
            self.get_with_query("/api/products", &params).await?;
        Ok(ProductPage::from(resp))
    }

    /// Get one product by id
    pub async fn get_product(&self, id: &str) -> ClientResult<ProductDto> {
        let resp: DataResponse<ProductPayload<ProductDto>> =
            self.get(&format!("/api/products/{}", id)).await?;
        Ok(resp.data.product)
    }

    /// Create a catalog product (admin)
    pub async fn create_product(&self, req: &ProductCreateRequest) -> ClientResult<ProductDto> {
        let resp: DataResponse<ProductPayload<ProductDto>> =
            self.post("/api/products", req).await?;
        Ok(resp.data.product)
    }

    /// Partially update a product (admin)
    pub async fn update_product(
        &self,
        id: &str,
        req: &ProductUpdateRequest,
    ) -> ClientResult<ProductDto> {
        let resp: DataResponse<ProductPayload<ProductDto>> =
            self.patch(&format!("/api/products/{}", id), req).await?;
        Ok(resp.data.product)
    }

    /// Delete a product (admin)
    pub async fn delete_product(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/api/products/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Place an order
    pub async fn create_order(&self, req: &OrderCreateRequest) -> ClientResult<OrderDto> {
        let resp: DataResponse<OrderPayload<OrderDto>> = self.post("/api/orders", req).await?;
        Ok(resp.data.order)
    }

    /// Place an order from the cart contents
    pub async fn checkout(
        &self,
        cart: &Cart,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> ClientResult<OrderDto> {
        let req = OrderCreateRequest {
            items: cart.to_order_items(),
            shipping_address,
            payment_method,
        };
        self.create_order(&req).await
    }

    /// List the current user's orders
    pub async fn my_orders(&self) -> ClientResult<Vec<OrderDto>> {
        let resp: ListResponse<OrdersPayload<OrderDto>> = self.get("/api/orders/my-orders").await?;
        Ok(resp.data.orders)
    }

    /// Get one order by id (owner or admin)
    pub async fn get_order(&self, id: &str) -> ClientResult<OrderDto> {
        let resp: DataResponse<OrderPayload<OrderDto>> =
            self.get(&format!("/api/orders/{}", id)).await?;
        Ok(resp.data.order)
    }

    /// Cancel an order that has not shipped yet
    pub async fn cancel_order(&self, id: &str) -> ClientResult<OrderDto> {
        let resp: DataResponse<OrderPayload<OrderDto>> =
            self.patch_empty(&format!("/api/orders/{}/cancel", id)).await?;
        Ok(resp.data.order)
    }

    /// List every order (admin)
    pub async fn list_all_orders(&self) -> ClientResult<Vec<OrderDto>> {
        let resp: ListResponse<OrdersPayload<OrderDto>> = self.get("/api/orders").await?;
        Ok(resp.data.orders)
    }

    /// Transition an order's fulfillment status (admin)
    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> ClientResult<OrderDto> {
        let req = OrderStatusUpdateRequest { status };
        let resp: DataResponse<OrderPayload<OrderDto>> = self
            .patch(&format!("/api/orders/{}/status", id), &req)
            .await?;
        Ok(resp.data.order)
    }

    /// Override an order's payment status (admin)
    pub async fn update_order_payment(
        &self,
        id: &str,
        payment_status: PaymentStatus,
        transaction_id: Option<String>,
    ) -> ClientResult<OrderDto> {
        let req = PaymentUpdateRequest {
            payment_status,
            transaction_id,
        };
        let resp: DataResponse<OrderPayload<OrderDto>> = self
            .patch(&format!("/api/orders/{}/payment", id), &req)
            .await?;
        Ok(resp.data.order)
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    /// Create a payment intent for an order, returns the client secret
    pub async fn create_payment_intent(&self, order_id: &str) -> ClientResult<String> {
        let req = PaymentIntentRequest {
            order_id: order_id.to_string(),
        };
        let resp: PaymentIntentResponse = self
            .post("/api/payments/create-payment-intent", &req)
            .await?;
        Ok(resp.client_secret)
    }

    /// Check an order's payment status (owner or admin)
    pub async fn get_payment_status(&self, order_id: &str) -> ClientResult<PaymentStatusPayload> {
        let resp: DataResponse<PaymentStatusPayload> = self
            .get(&format!("/api/payments/status/{}", order_id))
            .await?;
        Ok(resp.data)
    }

    // ------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------

    /// List reviews for a product (public)
    pub async fn list_product_reviews(&self, product_id: &str) -> ClientResult<Vec<ReviewDto>> {
        let resp: ListResponse<ReviewsPayload<ReviewDto>> = self
            .get(&format!("/api/reviews/product/{}", product_id))
            .await?;
        Ok(resp.data.reviews)
    }

    /// List the current user's reviews
    pub async fn my_reviews(&self) -> ClientResult<Vec<ReviewDto>> {
        let resp: ListResponse<ReviewsPayload<ReviewDto>> =
            self.get("/api/reviews/my-reviews").await?;
        Ok(resp.data.reviews)
    }

    /// Get one review by id (public)
    pub async fn get_review(&self, id: &str) -> ClientResult<ReviewDto> {
        let resp: DataResponse<ReviewPayload<ReviewDto>> =
            self.get(&format!("/api/reviews/{}", id)).await?;
        Ok(resp.data.review)
    }

    /// Review a product; one review per user per product
    pub async fn create_review(
        &self,
        product_id: &str,
        rating: i64,
        comment: &str,
    ) -> ClientResult<ReviewDto> {
        let req = ReviewCreateRequest {
            rating,
            comment: comment.to_string(),
        };
        let resp: DataResponse<ReviewPayload<ReviewDto>> = self
            .post(&format!("/api/reviews/product/{}", product_id), &req)
            .await?;
        Ok(resp.data.review)
    }

    /// Update the caller's own review
    pub async fn update_review(
        &self,
        id: &str,
        req: &ReviewUpdateRequest,
    ) -> ClientResult<ReviewDto> {
        let resp: DataResponse<ReviewPayload<ReviewDto>> =
            self.patch(&format!("/api/reviews/{}", id), req).await?;
        Ok(resp.data.review)
    }

    /// Delete a review (owner or admin)
    pub async fn delete_review(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/api/reviews/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    /// Server health probe
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        self.get("/health").await
    }
}
