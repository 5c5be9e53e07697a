//! Table-level data access
//!
//! Each table module owns its SQL and `FromRow` row types. Domain mapping
//! happens in [`crate::adapters`].

pub mod product;
pub mod invoice;

pub use product::{BalanceChange, ProductFilter, ProductRow, ProductTable};
pub use invoice::{InvoiceFilter, InvoiceItemRow, InvoiceRecord, InvoiceRow, InvoiceTable};
