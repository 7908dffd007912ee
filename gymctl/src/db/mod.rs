//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - business logic & queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Transactions
//!
//! Repositories work with SQLx transactions to ensure ACID properties.
//! Create repositories from a transaction for multi-step writes (member
//! admission, settlement); a plain acquired connection is fine for reads:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = Members::new(&mut tx);
//! // ... operations ...
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/` directory.
//! The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! gymctl::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
