//! Core Kernel - Foundational types for the pharmacy back office
//!
//! This crate provides the building blocks shared by every domain crate:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers for products, invoices and line items
//! - Port abstractions (errors, health checks) for the ports-and-adapters layout

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{ProductId, InvoiceId, InvoiceItemId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
