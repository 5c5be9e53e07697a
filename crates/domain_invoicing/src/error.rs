//! Invoicing domain errors

use core_kernel::{InvoiceId, MoneyError, PortError, ProductId};
use domain_inventory::InventoryError;
use thiserror::Error;

use crate::invoice::PaymentStatus;

/// Errors that can occur in the invoicing domain
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Malformed request, rejected before any stock moves
    #[error("Validation error: {0}")]
    Validation(String),

    /// A line item references an unknown product
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A line item asks for more than is on hand
    #[error("Insufficient stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// The invoice's status forbids the requested change
    #[error("Invoice {invoice_number} cannot be modified in status {status}")]
    InvoiceImmutable {
        invoice_number: String,
        status: PaymentStatus,
    },

    /// Mismatched currencies or an amount out of range
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Storage adapter failure
    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl InvoiceError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        InvoiceError::Validation(message.into())
    }

    /// Maps a port error for a specific invoice, turning `NotFound` into
    /// `InvoiceNotFound`
    pub fn from_port(invoice_id: InvoiceId, error: PortError) -> Self {
        if error.is_not_found() {
            InvoiceError::InvoiceNotFound(invoice_id)
        } else {
            InvoiceError::Port(error)
        }
    }
}

impl From<InventoryError> for InvoiceError {
    fn from(error: InventoryError) -> Self {
        match error {
            InventoryError::ProductNotFound(id) => InvoiceError::ProductNotFound(id),
            InventoryError::InsufficientStock {
                product_id,
                product_name,
                requested,
                available,
            } => InvoiceError::InsufficientStock {
                product_id,
                product_name,
                requested,
                available,
            },
            InventoryError::Validation(message) => InvoiceError::Validation(message),
            InventoryError::Port(e) => InvoiceError::Port(e),
        }
    }
}
