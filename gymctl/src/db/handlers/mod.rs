//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the system.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns database models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Users`]: Admin account management and login lookups
//! - [`Members`]: Member CRUD, business-id availability and suggestions
//! - [`Payments`]: Payment CRUD plus the lifecycle operations: monthly
//!   generation with dues accrual, settlement with the arrears cascade,
//!   rename propagation, and dashboard aggregates
//!
//! # Common Pattern
//!
//! ```ignore
//! use gymctl::db::handlers::{Members, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Members::new(&mut tx);
//!     let members = repo.list(&filter).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod members;
pub mod payments;
pub mod repository;
pub mod users;

pub use members::Members;
pub use payments::Payments;
pub use repository::Repository;
pub use users::Users;
