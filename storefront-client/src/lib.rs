//! Storefront Client - HTTP client for the storefront API
//!
//! Provides typed network calls for the whole REST surface, a persisted
//! login session with auto-logout, and a client-side shopping cart.

pub mod cart;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod storefront;

pub use cart::{Cart, CartItem};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, NetworkHttpClient};
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionData, SessionError, SessionStore,
};
pub use storefront::{HealthStatus, ProductPage, ProductQuery, StorefrontClient};

// Re-export shared wire types for convenience
pub use shared::client::{
    OrderCreateRequest, OrderItemRequest, ProductCreateRequest, ProductUpdateRequest,
    ReviewUpdateRequest,
};
pub use shared::models::{OrderDto, ProductDto, ReviewDto, ShippingAddress, UserPublic};
pub use shared::types::{OrderStatus, PaymentMethod, PaymentStatus, ProductCategory, Role};
