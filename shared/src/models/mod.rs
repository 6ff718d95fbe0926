//! Data models
//!
//! Public projections shared between the server and client library (via API).
//! Server-side storage rows live in the server crate; these are the shapes
//! that actually cross the wire.

pub mod order;
pub mod product;
pub mod review;
pub mod user;

// Re-exports
pub use order::*;
pub use product::*;
pub use review::*;
pub use user::*;
