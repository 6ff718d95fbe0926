//! Shared types for the storefront platform
//!
//! Wire-contract types used by both the API server and the client library:
//! response envelopes, domain enums, and public model projections.

pub mod client;
pub mod models;
pub mod response;
pub mod time;
pub mod types;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Domain enum re-exports (for convenient access)
pub use types::{OrderStatus, PaymentMethod, PaymentStatus, ProductCategory, Role};
