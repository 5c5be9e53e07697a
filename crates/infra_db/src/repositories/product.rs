//! Product table access

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Largest quantity a `u32` balance can hold; releases saturate here
pub const MAX_QUANTITY: i64 = u32::MAX as i64;

const PRODUCT_COLUMNS: &str = "id, name, barcode, batch_number, expiry_date, available_quantity, \
    minimum_quantity, currency, unit_price, selling_price, last_restocked_at, is_active, \
    created_at, updated_at";

/// A row of the `products` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub barcode: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub available_quantity: i64,
    pub minimum_quantity: i64,
    pub currency: String,
    pub unit_price: Decimal,
    pub selling_price: Decimal,
    pub last_restocked_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for [`ProductTable::find`]
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub name_contains: Option<String>,
    pub barcode: Option<String>,
    pub low_stock_only: bool,
    pub expiring_on_or_before: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Direction of an atomic balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    /// Conditional decrement
    Decrement(i64),
    /// Saturating increment
    Increment(i64),
    /// Saturating increment that stamps `last_restocked_at`
    Restock(i64),
}

/// Queries against the `products` table
#[derive(Debug, Clone)]
pub struct ProductTable {
    pool: PgPool,
}

impl ProductTable {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches one product row
    pub async fn get(&self, id: Uuid) -> Result<ProductRow, DatabaseError> {
        sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Product", id))
    }

    /// Inserts a product row
    pub async fn insert(&self, row: &ProductRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, barcode, batch_number, expiry_date, available_quantity,
                minimum_quantity, currency, unit_price, selling_price, last_restocked_at,
                is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.barcode)
        .bind(&row.batch_number)
        .bind(row.expiry_date)
        .bind(row.available_quantity)
        .bind(row.minimum_quantity)
        .bind(&row.currency)
        .bind(row.unit_price)
        .bind(row.selling_price)
        .bind(row.last_restocked_at)
        .bind(row.is_active)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Rewrites the descriptive columns; the balance is left alone
    pub async fn update_details(&self, row: &ProductRow) -> Result<ProductRow, DatabaseError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products SET
                name = $2, barcode = $3, batch_number = $4, expiry_date = $5,
                minimum_quantity = $6, unit_price = $7, selling_price = $8,
                is_active = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.barcode)
        .bind(&row.batch_number)
        .bind(row.expiry_date)
        .bind(row.minimum_quantity)
        .bind(row.unit_price)
        .bind(row.selling_price)
        .bind(row.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Product", row.id))
    }

    /// Lists products matching `filter`, ordered by name
    pub async fn find(&self, filter: &ProductFilter) -> Result<Vec<ProductRow>, DatabaseError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(ref name) = filter.name_contains {
            builder.push(" AND name ILIKE ").push_bind(format!("%{}%", escape_like(name)));
        }
        if let Some(ref barcode) = filter.barcode {
            builder.push(" AND barcode = ").push_bind(barcode.clone());
        }
        if filter.low_stock_only {
            builder.push(" AND available_quantity <= minimum_quantity");
        }
        if let Some(date) = filter.expiring_on_or_before {
            builder.push(" AND expiry_date <= ").push_bind(date);
        }
        if let Some(is_active) = filter.is_active {
            builder.push(" AND is_active = ").push_bind(is_active);
        }
        builder.push(" ORDER BY name, id");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = filter.offset {
            builder.push(" OFFSET ").push_bind(offset);
        }

        Ok(builder.build_query_as::<ProductRow>().fetch_all(&self.pool).await?)
    }

    /// Applies a balance change in one statement
    ///
    /// Returns `Ok(None)` when a decrement matched no row because the balance
    /// was too small; the caller re-reads to tell that apart from a missing
    /// product.
    pub async fn change_balance(&self, id: Uuid, change: BalanceChange) -> Result<Option<ProductRow>, DatabaseError> {
        let (sql, quantity) = match change {
            BalanceChange::Decrement(q) => (
                format!(
                    "UPDATE products SET available_quantity = available_quantity - $2, updated_at = NOW() \
                     WHERE id = $1 AND available_quantity >= $2 RETURNING {PRODUCT_COLUMNS}"
                ),
                q,
            ),
            BalanceChange::Increment(q) => (
                format!(
                    "UPDATE products SET available_quantity = LEAST(available_quantity + $2, {MAX_QUANTITY}), \
                     updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
                ),
                q,
            ),
            BalanceChange::Restock(q) => (
                format!(
                    "UPDATE products SET available_quantity = LEAST(available_quantity + $2, {MAX_QUANTITY}), \
                     last_restocked_at = NOW(), updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
                ),
                q,
            ),
        };

        Ok(sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await?)
    }
}

fn escape_like(input: &str) -> String {
    input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
