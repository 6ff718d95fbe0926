//! User wire models

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Public user projection returned by auth endpoints
///
/// The password hash never appears here; the server strips it before
/// anything reaches the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Minimal user projection attached to orders and reviews
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserBrief {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Owner field on orders and reviews
///
/// The API returns either a bare record id or a projected user object
/// depending on the endpoint, so both shapes decode into this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UserRef {
    Brief(UserBrief),
    Id(String),
}

impl UserRef {
    /// The referenced user id regardless of projection
    pub fn id(&self) -> &str {
        match self {
            UserRef::Brief(u) => &u.id,
            UserRef::Id(id) => id,
        }
    }
}
