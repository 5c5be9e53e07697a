//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the pharmacy core using SQLx.
//!
//! # Architecture
//!
//! - [`repositories`]: table-level SQL with `FromRow` row types
//! - [`adapters`]: implementations of `ProductRepository` and
//!   `InvoiceRepository` that map rows to domain models
//! - [`pool`]: pool configuration and embedded migrations
//!
//! Stock balances only change through single conditional `UPDATE`
//! statements, and an invoice header is always written together with its
//! items in one transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresProductAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/pharmacy")).await?;
//! run_migrations(&pool).await?;
//! let products = PostgresProductAdapter::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, DatabaseConfig, create_pool, run_migrations};
pub use error::DatabaseError;
pub use adapters::{PostgresInvoiceAdapter, PostgresProductAdapter};
