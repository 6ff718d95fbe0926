//! User Model

use serde::{Deserialize, Serialize};
use shared::Role;
use shared::models::UserPublic;
use surrealdb::RecordId;

/// User ID type
pub type UserId = RecordId;

/// User model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hash_pass: String,
    pub role: Role,
    pub created_at: i64,
}

/// Create user payload (plaintext password, hashed by the repository)
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl User {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.hash_pass)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }

    /// Public projection for API responses (no password hash)
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id.to_string(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = User::hash_password("s3cret-pass").unwrap();
        let user = User {
            id: "user:demo".parse().unwrap(),
            username: "demo".to_string(),
            email: "demo@example.com".to_string(),
            hash_pass: hash,
            role: Role::Customer,
            created_at: 0,
        };

        assert!(user.verify_password("s3cret-pass").unwrap());
        assert!(!user.verify_password("wrong-pass").unwrap());
    }

    #[test]
    fn serialization_never_exposes_hash() {
        let user = User {
            id: "user:demo".parse().unwrap(),
            username: "demo".to_string(),
            email: "demo@example.com".to_string(),
            hash_pass: "argon2-hash".to_string(),
            role: Role::Admin,
            created_at: 0,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("hash_pass").is_none());
    }
}
