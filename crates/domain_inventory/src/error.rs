//! Inventory domain errors

use core_kernel::{PortError, ProductId};
use thiserror::Error;

/// Errors that can occur in the inventory domain
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Referenced product does not exist
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Requested quantity exceeds what is on hand
    #[error("Insufficient stock for {product_name} ({product_id}): requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// Malformed input, rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage adapter failure
    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl InventoryError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        InventoryError::Validation(message.into())
    }

    /// Maps a port error for a specific product, turning `NotFound` into
    /// `ProductNotFound`
    pub fn from_port(product_id: ProductId, error: PortError) -> Self {
        if error.is_not_found() {
            InventoryError::ProductNotFound(product_id)
        } else {
            InventoryError::Port(error)
        }
    }
}
