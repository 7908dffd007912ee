//! API request/response models for authentication.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::UserResponse;

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Authentication result returned on successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub message: String,
}

/// Simple message response for auth operations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// Login response that carries the session cookie alongside the JSON body.
#[derive(Debug)]
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self.auth_response)).into_response();
        if let Ok(cookie) = self.cookie.parse() {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
        response
    }
}

/// Logout response that clears the session cookie.
#[derive(Debug)]
pub struct LogoutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self.auth_response)).into_response();
        if let Ok(cookie) = self.cookie.parse() {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
        response
    }
}
