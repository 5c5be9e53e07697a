//! Invoice table access
//!
//! Headers live in `invoices`, lines in `invoice_items`. Writes touch both
//! tables inside one transaction.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::error::DatabaseError;

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_name, customer_phone, customer_email, \
    customer_address, invoice_date, due_date, currency, subtotal, discount_amount, \
    discount_percentage, tax_amount, tax_percentage, total_amount, payment_status, payment_method, \
    paid_amount, notes, is_active, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, invoice_id, position, product_id, product_name, product_barcode, \
    batch_number, expiry_date, quantity, unit_price, discount_amount, discount_percentage, line_total";

/// A row of the `invoices` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub tax_amount: Decimal,
    pub tax_percentage: Option<Decimal>,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub payment_method: String,
    pub paid_amount: Decimal,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of the `invoice_items` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceItemRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_barcode: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub line_total: Decimal,
}

/// A header together with its lines, ordered by position
#[derive(Debug, Clone)]
pub struct InvoiceRecord {
    pub header: InvoiceRow,
    pub items: Vec<InvoiceItemRow>,
}

/// Filters for [`InvoiceTable::find`]
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub payment_status: Option<String>,
    pub is_active: Option<bool>,
    pub customer_name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Queries against the invoice tables
#[derive(Debug, Clone)]
pub struct InvoiceTable {
    pool: PgPool,
}

impl InvoiceTable {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches a header and its lines
    pub async fn get(&self, id: Uuid) -> Result<InvoiceRecord, DatabaseError> {
        let header = sqlx::query_as::<_, InvoiceRow>(&format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Invoice", id))?;

        let items = sqlx::query_as::<_, InvoiceItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = $1 ORDER BY position"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(InvoiceRecord { header, items })
    }

    /// Number of the most recently inserted invoice
    ///
    /// Ordered by the `seq` column rather than `created_at`, which is set by
    /// the caller and need not follow insertion order.
    pub async fn latest_number(&self) -> Result<Option<String>, DatabaseError> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT invoice_number FROM invoices ORDER BY seq DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Inserts a header and its lines in one transaction
    pub async fn insert(&self, record: &InvoiceRecord) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, customer_name, customer_phone, customer_email,
                customer_address, invoice_date, due_date, currency, subtotal, discount_amount,
                discount_percentage, tax_amount, tax_percentage, total_amount, payment_status,
                payment_method, paid_amount, notes, is_active, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )
            "#,
        )
        .bind(record.header.id)
        .bind(&record.header.invoice_number)
        .bind(&record.header.customer_name)
        .bind(&record.header.customer_phone)
        .bind(&record.header.customer_email)
        .bind(&record.header.customer_address)
        .bind(record.header.invoice_date)
        .bind(record.header.due_date)
        .bind(&record.header.currency)
        .bind(record.header.subtotal)
        .bind(record.header.discount_amount)
        .bind(record.header.discount_percentage)
        .bind(record.header.tax_amount)
        .bind(record.header.tax_percentage)
        .bind(record.header.total_amount)
        .bind(&record.header.payment_status)
        .bind(&record.header.payment_method)
        .bind(record.header.paid_amount)
        .bind(&record.header.notes)
        .bind(record.header.is_active)
        .bind(record.header.created_at)
        .bind(record.header.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, &record.items).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Rewrites a header and replaces all of its lines in one transaction
    pub async fn replace(&self, record: &InvoiceRecord) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE invoices SET
                customer_name = $2, customer_phone = $3, customer_email = $4,
                customer_address = $5, invoice_date = $6, due_date = $7, subtotal = $8,
                discount_amount = $9, discount_percentage = $10, tax_amount = $11,
                tax_percentage = $12, total_amount = $13, payment_status = $14,
                payment_method = $15, paid_amount = $16, notes = $17, is_active = $18,
                updated_at = $19
            WHERE id = $1
            "#,
        )
        .bind(record.header.id)
        .bind(&record.header.customer_name)
        .bind(&record.header.customer_phone)
        .bind(&record.header.customer_email)
        .bind(&record.header.customer_address)
        .bind(record.header.invoice_date)
        .bind(record.header.due_date)
        .bind(record.header.subtotal)
        .bind(record.header.discount_amount)
        .bind(record.header.discount_percentage)
        .bind(record.header.tax_amount)
        .bind(record.header.tax_percentage)
        .bind(record.header.total_amount)
        .bind(&record.header.payment_status)
        .bind(&record.header.payment_method)
        .bind(record.header.paid_amount)
        .bind(&record.header.notes)
        .bind(record.header.is_active)
        .bind(record.header.updated_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", record.header.id));
        }

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
            .bind(record.header.id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, &record.items).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Lists invoices matching `filter`, newest first
    pub async fn find(&self, filter: &InvoiceFilter) -> Result<Vec<InvoiceRecord>, DatabaseError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE TRUE"));

        if let Some(ref status) = filter.payment_status {
            builder.push(" AND payment_status = ").push_bind(status.clone());
        }
        if let Some(is_active) = filter.is_active {
            builder.push(" AND is_active = ").push_bind(is_active);
        }
        if let Some(ref name) = filter.customer_name {
            builder
                .push(" AND customer_name ILIKE ")
                .push_bind(format!("%{}%", name.replace('%', "\\%").replace('_', "\\_")));
        }
        builder.push(" ORDER BY created_at DESC, invoice_number DESC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = filter.offset {
            builder.push(" OFFSET ").push_bind(offset);
        }

        let headers = builder.build_query_as::<InvoiceRow>().fetch_all(&self.pool).await?;
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let rows = sqlx::query_as::<_, InvoiceItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = ANY($1) ORDER BY invoice_id, position"
        ))
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_invoice: HashMap<Uuid, Vec<InvoiceItemRow>> = HashMap::new();
        for row in rows {
            items_by_invoice.entry(row.invoice_id).or_default().push(row);
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let items = items_by_invoice.remove(&header.id).unwrap_or_default();
                InvoiceRecord { header, items }
            })
            .collect())
    }
}

async fn insert_items(tx: &mut Transaction<'_, Postgres>, items: &[InvoiceItemRow]) -> Result<(), DatabaseError> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                id, invoice_id, position, product_id, product_name, product_barcode,
                batch_number, expiry_date, quantity, unit_price, discount_amount,
                discount_percentage, line_total
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(item.id)
        .bind(item.invoice_id)
        .bind(item.position)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(&item.product_barcode)
        .bind(&item.batch_number)
        .bind(item.expiry_date)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.discount_amount)
        .bind(item.discount_percentage)
        .bind(item.line_total)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
