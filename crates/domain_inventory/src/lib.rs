//! Inventory Domain - Products and the Stock Ledger
//!
//! This crate owns the pharmacy's product records and the one invariant that
//! matters for sales: a product's available quantity never goes negative.
//!
//! # Stock Operations
//!
//! - **Reserve**: decrement for a sale; rejected when the request exceeds the
//!   available quantity, leaving the balance untouched
//! - **Release**: increment when a sale is edited away or cancelled
//! - **Restock**: explicit inbound adjustment, the only operation that stamps
//!   `last_restocked_at`
//!
//! The check and the mutation happen as one step inside the repository
//! adapter, so concurrent sales of the same product cannot oversell.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_inventory::{StockLedger, ports::memory::InMemoryProductRepository};
//!
//! let ledger = StockLedger::new(Arc::new(InMemoryProductRepository::new()));
//! let remaining = ledger.reserve(product_id, 3).await?;
//! ```

pub mod product;
pub mod ports;
pub mod ledger;
pub mod error;

pub use product::{Product, ProductSnapshot, StockChange};
pub use ports::{ProductRepository, ProductQuery, ProductUpdate, StockChangeOutcome};
pub use ledger::StockLedger;
pub use error::InventoryError;
