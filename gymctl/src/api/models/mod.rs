//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database models,
//!   allowing independent evolution of API and storage representations
//! - **Validation**: Models use serde for deserialization and validation
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API docs
//!
//! # Model Categories
//!
//! ## Resource Models
//!
//! - [`members`]: Member profiles, registration and update requests
//! - [`payments`]: Payment records, settlement and monthly generation
//! - [`dashboard`]: Aggregate statistics for the current billing period
//! - [`users`]: Admin user profiles
//!
//! ## Authentication Models
//!
//! - [`auth`]: Login and logout payloads

pub mod auth;
pub mod dashboard;
pub mod members;
pub mod pagination;
pub mod payments;
pub mod users;
