//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by repositories to return query results
//! and accept insertion/update data.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each model struct matches a database table schema
//! - **SQLx Integration**: Response models derive `sqlx::FromRow` for query results
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//!
//! # Models
//!
//! - [`users`]: Admin accounts for the control panel
//! - [`members`]: Gym member identity and billing attributes
//! - [`payments`]: One payment record per member per billing period
//!
//! Database models implement `From`/`Into` conversions to and from the API
//! models in [`crate::api::models`].

pub mod members;
pub mod payments;
pub mod users;
