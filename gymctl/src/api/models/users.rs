//! API request/response models for admin users.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The authenticated user, as carried in the session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub display_name: Option<String>,
}

/// User profile returned by `/authentication/me`. Never includes the
/// password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            display_name: db.display_name,
            is_admin: db.is_admin,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            is_admin: db.is_admin,
            display_name: db.display_name,
        }
    }
}
