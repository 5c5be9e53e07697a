//! Invoicing Domain - Invoices and the Stock-Reserving Lifecycle
//!
//! This crate owns the invoice aggregate and keeps product stock consistent
//! with the set of non-cancelled invoice items across create, edit and
//! cancel.
//!
//! # Lifecycle
//!
//! ```text
//!   create ──► pending ◄──────┐
//!      │          │           │ update_status
//!      └──► paid ◄┘ (paid ≥ total)
//!                 │
//!   cancel ──► cancelled ──► (edit reactivates, when enabled)
//! ```
//!
//! - **Create**: validates, reserves each item, numbers and stores the invoice
//! - **Edit**: releases the old items, reserves the new ones; paid invoices
//!   are immutable
//! - **Cancel**: releases every item; idempotent
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_invoicing::{InvoiceLifecycle, InvoiceRequest, LineItemRequest};
//!
//! let lifecycle = InvoiceLifecycle::new(ledger, invoices);
//! let invoice = lifecycle
//!     .create(InvoiceRequest::new("Walk-in", vec![LineItemRequest::new(product_id, 3, dec!(100))]))
//!     .await?;
//! assert_eq!(invoice.invoice_number, "INV000001");
//! ```

pub mod invoice;
pub mod request;
pub mod numbering;
pub mod lifecycle;
pub mod ports;
pub mod error;

pub use invoice::{CustomerSnapshot, Invoice, InvoiceItem, PaymentMethod, PaymentStatus};
pub use request::{InvoiceRequest, LineItemRequest, PricedRequest};
pub use numbering::InvoiceNumbering;
pub use lifecycle::{InvoiceLifecycle, LifecyclePolicy};
pub use ports::{InvoiceQuery, InvoiceRepository};
pub use error::InvoiceError;
