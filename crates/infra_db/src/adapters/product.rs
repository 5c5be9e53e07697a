//! PostgreSQL Product Adapter
//!
//! Implements `ProductRepository` over the `products` table. Stock changes
//! are single conditional `UPDATE` statements, so a reservation can never
//! drive the balance below zero even with many concurrent writers.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{Currency, DomainPort, HealthCheckResult, HealthCheckable, Money, PortError, ProductId};
use domain_inventory::{Product, ProductQuery, ProductRepository, ProductUpdate, StockChange, StockChangeOutcome};

use crate::adapters::{ping, to_quantity};
use crate::repositories::{BalanceChange, ProductFilter, ProductRow, ProductTable};

/// PostgreSQL-backed [`ProductRepository`]
#[derive(Debug, Clone)]
pub struct PostgresProductAdapter {
    table: ProductTable,
    pool: PgPool,
}

impl PostgresProductAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            table: ProductTable::new(pool.clone()),
            pool,
        }
    }

    /// Direct table access for queries the port does not expose
    pub fn table(&self) -> &ProductTable {
        &self.table
    }
}

impl DomainPort for PostgresProductAdapter {}

#[async_trait]
impl HealthCheckable for PostgresProductAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-products").await
    }
}

#[async_trait]
impl ProductRepository for PostgresProductAdapter {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
        debug!("Fetching product");
        let row = self.table.get(id.into()).await?;
        row_to_product(row)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn create_product(&self, product: Product) -> Result<Product, PortError> {
        self.table.insert(&product_to_row(&product)).await?;
        Ok(product)
    }

    #[instrument(skip(self, update), fields(product_id = %id))]
    async fn update_details(&self, id: ProductId, update: ProductUpdate) -> Result<Product, PortError> {
        let mut product = self.get_product(id).await?;
        update.apply_to(&mut product);
        let row = self.table.update_details(&product_to_row(&product)).await?;
        row_to_product(row)
    }

    #[instrument(skip(self))]
    async fn find_products(&self, query: ProductQuery) -> Result<Vec<Product>, PortError> {
        let filter = ProductFilter {
            name_contains: query.name_contains,
            barcode: query.barcode,
            low_stock_only: query.low_stock_only,
            expiring_on_or_before: query.expiring_on_or_before,
            is_active: query.is_active,
            limit: query.limit.map(i64::from),
            offset: query.offset.map(i64::from),
        };
        let rows = self.table.find(&filter).await?;
        debug!(count = rows.len(), "Products found");
        rows.into_iter().map(row_to_product).collect()
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn apply_stock_change(&self, id: ProductId, change: StockChange) -> Result<StockChangeOutcome, PortError> {
        let balance_change = match change {
            StockChange::Reserve(q) => BalanceChange::Decrement(i64::from(q)),
            StockChange::Release(q) => BalanceChange::Increment(i64::from(q)),
            StockChange::Restock(q) => BalanceChange::Restock(i64::from(q)),
        };

        match self.table.change_balance(id.into(), balance_change).await? {
            Some(row) => {
                let product = row_to_product(row)?;
                debug!(?change, available = product.available_quantity, "Stock change applied");
                Ok(StockChangeOutcome::Applied(product))
            }
            None => {
                // no row matched: either missing, or too little stock for a reservation
                let product = self.get_product(id).await?;
                debug!(?change, available = product.available_quantity, "Stock change rejected");
                Ok(StockChangeOutcome::Rejected(product))
            }
        }
    }
}

/// Maps a row to the domain product
pub fn row_to_product(row: ProductRow) -> Result<Product, PortError> {
    let currency: Currency = row
        .currency
        .trim()
        .parse()
        .map_err(|e| PortError::transformation(format!("product {}: {e}", row.id)))?;

    Ok(Product {
        id: ProductId::from(row.id),
        name: row.name,
        barcode: row.barcode,
        batch_number: row.batch_number,
        expiry_date: row.expiry_date,
        available_quantity: to_quantity("available_quantity", row.available_quantity)?,
        minimum_quantity: to_quantity("minimum_quantity", row.minimum_quantity)?,
        unit_price: Money::new(row.unit_price, currency),
        selling_price: Money::new(row.selling_price, currency),
        last_restocked_at: row.last_restocked_at,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Maps a domain product to its row
pub fn product_to_row(product: &Product) -> ProductRow {
    ProductRow {
        id: product.id.into(),
        name: product.name.clone(),
        barcode: product.barcode.clone(),
        batch_number: product.batch_number.clone(),
        expiry_date: product.expiry_date,
        available_quantity: i64::from(product.available_quantity),
        minimum_quantity: i64::from(product.minimum_quantity),
        currency: product.selling_price.currency().code().to_string(),
        unit_price: product.unit_price.amount(),
        selling_price: product.selling_price.amount(),
        last_restocked_at: product.last_restocked_at,
        is_active: product.is_active,
        created_at: product.created_at,
        updated_at: product.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_row_round_trip() {
        let product = Product::new(
            "Paracetamol 500mg",
            Money::new(dec!(1.25), Currency::INR),
            Money::new(dec!(2.00), Currency::INR),
        )
        .with_barcode("8901234567890")
        .with_batch("B-2291", NaiveDate::from_ymd_opt(2027, 2, 28))
        .with_quantity(120)
        .with_minimum(20);

        let back = row_to_product(product_to_row(&product)).unwrap();
        assert_eq!(back, product);
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let product = Product::new("X", Money::zero(Currency::INR), Money::zero(Currency::INR));
        let mut row = product_to_row(&product);
        row.available_quantity = -1;

        assert!(matches!(row_to_product(row), Err(PortError::Transformation { .. })));
    }

    #[test]
    fn test_unknown_currency_is_rejected() {
        let product = Product::new("X", Money::zero(Currency::INR), Money::zero(Currency::INR));
        let mut row = product_to_row(&product);
        row.currency = "XXX".into();

        assert!(row_to_product(row).is_err());
    }
}
