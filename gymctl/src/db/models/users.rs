//! Database models for users.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub password_hash: Option<String>,
}

/// Database request for updating a user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: Option<bool>,
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
