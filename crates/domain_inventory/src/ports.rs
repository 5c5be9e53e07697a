//! Inventory Domain Ports
//!
//! [`ProductRepository`] is everything the inventory domain needs from
//! storage. The in-memory adapter in [`memory`] backs tests and the
//! database-less server mode; the PostgreSQL adapter lives in `infra_db`.
//!
//! # Atomicity
//!
//! `apply_stock_change` is the only way to move stock. Adapters must perform
//! the availability check and the write as one indivisible step: a single
//! write lock in memory, a conditional `UPDATE` in PostgreSQL. A rejected
//! reservation comes back as [`StockChangeOutcome::Rejected`] carrying the
//! current record, never as an error.

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::{DomainPort, HealthCheckable, Money, PortError, ProductId};

use crate::product::{Product, StockChange};

/// Query parameters for finding products
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Case-insensitive substring match on the product name
    pub name_contains: Option<String>,
    /// Exact barcode match
    pub barcode: Option<String>,
    /// Only products at or below their minimum quantity
    pub low_stock_only: bool,
    /// Only products whose batch expires on or before this date
    pub expiring_on_or_before: Option<NaiveDate>,
    /// Filter by active status
    pub is_active: Option<bool>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl ProductQuery {
    /// Products at or below their minimum quantity
    pub fn low_stock() -> Self {
        Self {
            low_stock_only: true,
            is_active: Some(true),
            ..Default::default()
        }
    }

    /// Products whose batch expires on or before `date`
    pub fn expiring_on_or_before(date: NaiveDate) -> Self {
        Self {
            expiring_on_or_before: Some(date),
            is_active: Some(true),
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Returns true if `product` satisfies every filter set on the query
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(ref needle) = self.name_contains {
            if !product.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(ref barcode) = self.barcode {
            if product.barcode.as_ref() != Some(barcode) {
                return false;
            }
        }
        if self.low_stock_only && !product.is_low_stock() {
            return false;
        }
        if let Some(date) = self.expiring_on_or_before {
            if !product.expiry_date.is_some_and(|expiry| expiry <= date) {
                return false;
            }
        }
        if let Some(is_active) = self.is_active {
            if product.is_active != is_active {
                return false;
            }
        }
        true
    }
}

/// Descriptive changes to a product; stock is never touched here
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub minimum_quantity: Option<u32>,
    pub unit_price: Option<Money>,
    pub selling_price: Option<Money>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    /// Applies the set fields to `product`
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(ref name) = self.name {
            product.name = name.clone();
        }
        if let Some(ref barcode) = self.barcode {
            product.barcode = Some(barcode.clone());
        }
        if let Some(ref batch) = self.batch_number {
            product.batch_number = Some(batch.clone());
        }
        if let Some(expiry) = self.expiry_date {
            product.expiry_date = Some(expiry);
        }
        if let Some(minimum) = self.minimum_quantity {
            product.minimum_quantity = minimum;
        }
        if let Some(price) = self.unit_price {
            product.unit_price = price;
        }
        if let Some(price) = self.selling_price {
            product.selling_price = price;
        }
        if let Some(is_active) = self.is_active {
            product.is_active = is_active;
        }
    }
}

/// Result of an atomic stock change
#[derive(Debug, Clone, PartialEq)]
pub enum StockChangeOutcome {
    /// The change was applied; carries the updated product
    Applied(Product),
    /// A reservation exceeded the available quantity; carries the unchanged product
    Rejected(Product),
}

impl StockChangeOutcome {
    /// The product as it stands after the attempt
    pub fn product(&self) -> &Product {
        match self {
            StockChangeOutcome::Applied(p) | StockChangeOutcome::Rejected(p) => p,
        }
    }

    /// Returns true if the change was applied
    pub fn is_applied(&self) -> bool {
        matches!(self, StockChangeOutcome::Applied(_))
    }
}

/// Storage port for products
#[async_trait]
pub trait ProductRepository: DomainPort + HealthCheckable {
    /// Retrieves a product by ID, or `PortError::NotFound`
    async fn get_product(&self, id: ProductId) -> Result<Product, PortError>;

    /// Stores a new product; `PortError::Conflict` if the ID is taken
    async fn create_product(&self, product: Product) -> Result<Product, PortError>;

    /// Applies descriptive changes and returns the updated product
    async fn update_details(&self, id: ProductId, update: ProductUpdate) -> Result<Product, PortError>;

    /// Finds products matching the query, ordered by name
    async fn find_products(&self, query: ProductQuery) -> Result<Vec<Product>, PortError>;

    /// Atomically checks and applies a stock change
    async fn apply_stock_change(
        &self,
        id: ProductId,
        change: StockChange,
    ) -> Result<StockChangeOutcome, PortError>;
}

/// In-memory product storage
///
/// Always compiled: the API server falls back to it when no database is
/// configured, and downstream crates use it in their tests.
pub mod memory {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// HashMap-backed implementation of [`ProductRepository`]
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryProductRepository {
        products: Arc<RwLock<HashMap<ProductId, Product>>>,
    }

    impl InMemoryProductRepository {
        /// Creates an empty repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with products
        pub async fn with_products(products: Vec<Product>) -> Self {
            let repo = Self::new();
            {
                let mut map = repo.products.write().await;
                for product in products {
                    map.insert(product.id, product);
                }
            }
            repo
        }

        /// Number of stored products
        pub async fn len(&self) -> usize {
            self.products.read().await.len()
        }

        /// Returns true if nothing is stored
        pub async fn is_empty(&self) -> bool {
            self.products.read().await.is_empty()
        }
    }

    impl DomainPort for InMemoryProductRepository {}

    #[async_trait]
    impl HealthCheckable for InMemoryProductRepository {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-products")
        }
    }

    #[async_trait]
    impl ProductRepository for InMemoryProductRepository {
        async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
            self.products
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Product", id))
        }

        async fn create_product(&self, product: Product) -> Result<Product, PortError> {
            let mut products = self.products.write().await;
            if products.contains_key(&product.id) {
                return Err(PortError::conflict(format!("Product {} already exists", product.id)));
            }
            products.insert(product.id, product.clone());
            Ok(product)
        }

        async fn update_details(&self, id: ProductId, update: ProductUpdate) -> Result<Product, PortError> {
            let mut products = self.products.write().await;
            let product = products
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Product", id))?;
            update.apply_to(product);
            product.updated_at = Utc::now();
            Ok(product.clone())
        }

        async fn find_products(&self, query: ProductQuery) -> Result<Vec<Product>, PortError> {
            let products = self.products.read().await;
            let mut results: Vec<_> = products
                .values()
                .filter(|p| query.matches(p))
                .cloned()
                .collect();
            results.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(results.into_iter().skip(offset).take(limit).collect())
        }

        async fn apply_stock_change(
            &self,
            id: ProductId,
            change: StockChange,
        ) -> Result<StockChangeOutcome, PortError> {
            let mut products = self.products.write().await;
            let product = products
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Product", id))?;

            if product.apply_stock_change(change, Utc::now()) {
                Ok(StockChangeOutcome::Applied(product.clone()))
            } else {
                Ok(StockChangeOutcome::Rejected(product.clone()))
            }
        }
    }
}
