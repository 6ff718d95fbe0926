//! Database Models

pub mod order;
pub mod product;
pub mod review;
pub mod user;

// Re-exports
pub use order::{Order, OrderCreate, OrderId};
pub use product::{Product, ProductCreate, ProductId, ProductQuery, ProductSort, ProductUpdate, SortField};
pub use review::{Review, ReviewCreate, ReviewId, ReviewUpdate};
pub use user::{User, UserCreate, UserId};
