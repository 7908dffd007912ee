//! Authentication and authorization.
//!
//! Admin users log in via `/authentication/login` with username/password.
//! Credentials are checked against Argon2 hashes, and a signed JWT session
//! token with an explicit expiry is issued. The token travels either in a
//! secure HTTP-only cookie or as an `Authorization: Bearer` header, and is
//! verified server-side on every request.
//!
//! # Modules
//!
//! - [`current_user`]: `FromRequestParts` extractor for the authenticated user
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: JWT session token creation and verification

pub mod current_user;
pub mod password;
pub mod session;

use crate::api::models::users::CurrentUser;
use crate::errors::{Error, Result};
use crate::types::{Operation, Permission, Resource};

/// Gate for mutating endpoints: the caller must be an admin.
pub fn require_admin(user: &CurrentUser, action: Operation, resource: Resource) -> Result<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Allow(resource, action),
            action,
            resource: format!("{resource:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_require_admin() {
        let admin = CurrentUser {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            is_admin: true,
            display_name: None,
        };
        assert!(require_admin(&admin, Operation::Delete, Resource::Members).is_ok());

        let viewer = CurrentUser { is_admin: false, ..admin };
        let error = require_admin(&viewer, Operation::Delete, Resource::Members).unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
