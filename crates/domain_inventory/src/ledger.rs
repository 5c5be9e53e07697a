//! Stock ledger service

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{debug, info, instrument, warn};

use core_kernel::ProductId;

use crate::error::InventoryError;
use crate::ports::{ProductQuery, ProductRepository, ProductUpdate, StockChangeOutcome};
use crate::product::{Product, StockChange};

/// Application service over a [`ProductRepository`]
///
/// Every stock movement goes through here so that quantity validation and
/// error mapping live in one place. Cheap to clone.
#[derive(Clone)]
pub struct StockLedger {
    repository: Arc<dyn ProductRepository>,
}

impl StockLedger {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    /// The underlying repository
    pub fn repository(&self) -> &Arc<dyn ProductRepository> {
        &self.repository
    }

    /// Registers a new product
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn register(&self, product: Product) -> Result<Product, InventoryError> {
        if product.name.trim().is_empty() {
            return Err(InventoryError::validation("Product name is required"));
        }
        if product.unit_price.is_negative() || product.selling_price.is_negative() {
            return Err(InventoryError::validation("Product prices cannot be negative"));
        }
        let product = self.repository.create_product(product).await?;
        info!(name = %product.name, quantity = product.available_quantity, "Product registered");
        Ok(product)
    }

    /// Applies descriptive changes to a product
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update_details(&self, id: ProductId, update: ProductUpdate) -> Result<Product, InventoryError> {
        self.repository
            .update_details(id, update)
            .await
            .map_err(|e| InventoryError::from_port(id, e))
    }

    /// Fetches a product
    pub async fn product(&self, id: ProductId) -> Result<Product, InventoryError> {
        self.repository
            .get_product(id)
            .await
            .map_err(|e| InventoryError::from_port(id, e))
    }

    /// Current available quantity of a product
    pub async fn available(&self, id: ProductId) -> Result<u32, InventoryError> {
        Ok(self.product(id).await?.available_quantity)
    }

    /// Decrements stock for a sale
    ///
    /// Returns the remaining quantity. Fails with `InsufficientStock`, leaving
    /// the balance untouched, when `quantity` exceeds what is available.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn reserve(&self, id: ProductId, quantity: u32) -> Result<u32, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::validation("Reserved quantity must be at least 1"));
        }

        match self.change(id, StockChange::Reserve(quantity)).await? {
            StockChangeOutcome::Applied(product) => {
                debug!(remaining = product.available_quantity, "Stock reserved");
                Ok(product.available_quantity)
            }
            StockChangeOutcome::Rejected(product) => {
                warn!(
                    requested = quantity,
                    available = product.available_quantity,
                    "Reservation rejected"
                );
                Err(InventoryError::InsufficientStock {
                    product_id: id,
                    product_name: product.name,
                    requested: quantity,
                    available: product.available_quantity,
                })
            }
        }
    }

    /// Returns previously reserved stock
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn release(&self, id: ProductId, quantity: u32) -> Result<u32, InventoryError> {
        if quantity == 0 {
            return self.available(id).await;
        }
        let outcome = self.change(id, StockChange::Release(quantity)).await?;
        debug!(available = outcome.product().available_quantity, "Stock released");
        Ok(outcome.product().available_quantity)
    }

    /// Records inbound stock
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn restock(&self, id: ProductId, quantity: u32) -> Result<Product, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::validation("Restock quantity must be at least 1"));
        }
        let outcome = self.change(id, StockChange::Restock(quantity)).await?;
        let product = outcome.product().clone();
        info!(added = quantity, available = product.available_quantity, "Product restocked");
        Ok(product)
    }

    /// Active products at or below their minimum quantity
    pub async fn low_stock(&self) -> Result<Vec<Product>, InventoryError> {
        Ok(self.repository.find_products(ProductQuery::low_stock()).await?)
    }

    /// Active products whose batch expires within `days` of `today`
    pub async fn expiring_within(&self, days: u32, today: NaiveDate) -> Result<Vec<Product>, InventoryError> {
        let horizon = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        Ok(self
            .repository
            .find_products(ProductQuery::expiring_on_or_before(horizon))
            .await?)
    }

    /// Finds products with an arbitrary query
    pub async fn find(&self, query: ProductQuery) -> Result<Vec<Product>, InventoryError> {
        Ok(self.repository.find_products(query).await?)
    }

    async fn change(&self, id: ProductId, change: StockChange) -> Result<StockChangeOutcome, InventoryError> {
        self.repository
            .apply_stock_change(id, change)
            .await
            .map_err(|e| InventoryError::from_port(id, e))
    }
}

impl std::fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockLedger").finish_non_exhaustive()
    }
}
