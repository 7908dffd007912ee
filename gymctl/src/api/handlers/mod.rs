//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Login, logout and current-user retrieval
//! - [`members`]: Member CRUD, ID availability checks, payment history and
//!   dues standing
//! - [`payments`]: Payment listing, manual corrections, settlement and the
//!   monthly generation sweep
//! - [`dashboard`]: Aggregate statistics for the current billing period
//!
//! # Authentication
//!
//! All handlers except login require a session, supplied either as a bearer
//! token or a session cookie. The [`crate::auth::current_user`] extractor
//! resolves it; mutating endpoints additionally require the admin flag.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and error responses.

pub mod auth;
pub mod dashboard;
pub mod members;
pub mod payments;
