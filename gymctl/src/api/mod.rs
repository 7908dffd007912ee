//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! The API is divided into several functional areas:
//!
//! - **Authentication** (`/authentication/*`): Login, logout, current user
//! - **Members** (`/api/v1/members/*`): Member registration, profiles,
//!   payment history and dues standing
//! - **Payments** (`/api/v1/payments/*`): Payment records, settlement and
//!   monthly generation
//! - **Dashboard** (`/api/v1/dashboard`): Current-period statistics
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
