//! Request and response bodies

pub mod products;
pub mod invoices;
