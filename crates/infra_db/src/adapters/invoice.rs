//! PostgreSQL Invoice Adapter
//!
//! Implements `InvoiceRepository` over the `invoices` and `invoice_items`
//! tables. A duplicate invoice number surfaces as `PortError::Conflict`
//! through the unique index.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    Currency, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, InvoiceItemId, Money, PortError,
    ProductId,
};
use domain_inventory::ProductSnapshot;
use domain_invoicing::{
    CustomerSnapshot, Invoice, InvoiceItem, InvoiceQuery, InvoiceRepository, PaymentMethod, PaymentStatus,
};

use crate::adapters::{ping, to_quantity};
use crate::repositories::{InvoiceFilter, InvoiceItemRow, InvoiceRecord, InvoiceRow, InvoiceTable};

/// PostgreSQL-backed [`InvoiceRepository`]
#[derive(Debug, Clone)]
pub struct PostgresInvoiceAdapter {
    table: InvoiceTable,
    pool: PgPool,
}

impl PostgresInvoiceAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            table: InvoiceTable::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresInvoiceAdapter {}

#[async_trait]
impl HealthCheckable for PostgresInvoiceAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-invoices").await
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceAdapter {
    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        debug!("Fetching invoice");
        let record = self.table.get(id.into()).await?;
        record_to_invoice(record)
    }

    async fn latest_invoice_number(&self) -> Result<Option<String>, PortError> {
        Ok(self.table.latest_number().await?)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id, invoice_number = %invoice.invoice_number))]
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        self.table.insert(&invoice_to_record(invoice)).await?;
        debug!(items = invoice.items.len(), "Invoice inserted");
        Ok(())
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn replace_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        self.table.replace(&invoice_to_record(invoice)).await?;
        debug!(items = invoice.items.len(), "Invoice replaced");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_invoices(&self, query: InvoiceQuery) -> Result<Vec<Invoice>, PortError> {
        let filter = InvoiceFilter {
            payment_status: query.status.map(|s| s.as_str().to_string()),
            is_active: query.is_active,
            customer_name: query.customer_name,
            limit: query.limit.map(i64::from),
            offset: query.offset.map(i64::from),
        };
        let records = self.table.find(&filter).await?;
        records.into_iter().map(record_to_invoice).collect()
    }
}

/// Maps a stored header and its lines to the domain invoice
pub fn record_to_invoice(record: InvoiceRecord) -> Result<Invoice, PortError> {
    let InvoiceRecord { header, items } = record;
    let bad = |what: String| PortError::transformation(format!("invoice {}: {what}", header.id));

    let currency: Currency = header.currency.trim().parse().map_err(|e| bad(format!("{e}")))?;
    let payment_status: PaymentStatus = header.payment_status.parse().map_err(bad)?;
    let payment_method: PaymentMethod = header.payment_method.parse().map_err(bad)?;
    let invoice_id = InvoiceId::from(header.id);

    let items = items
        .into_iter()
        .map(|row| item_from_row(row, invoice_id, currency))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Invoice {
        id: invoice_id,
        invoice_number: header.invoice_number,
        customer: CustomerSnapshot {
            name: header.customer_name,
            phone: header.customer_phone,
            email: header.customer_email,
            address: header.customer_address,
        },
        invoice_date: header.invoice_date,
        due_date: header.due_date,
        currency,
        items,
        subtotal: Money::new(header.subtotal, currency),
        discount_amount: Money::new(header.discount_amount, currency),
        discount_percentage: header.discount_percentage,
        tax_amount: Money::new(header.tax_amount, currency),
        tax_percentage: header.tax_percentage,
        total_amount: Money::new(header.total_amount, currency),
        payment_status,
        payment_method,
        paid_amount: Money::new(header.paid_amount, currency),
        notes: header.notes,
        is_active: header.is_active,
        created_at: header.created_at,
        updated_at: header.updated_at,
    })
}

fn item_from_row(row: InvoiceItemRow, invoice_id: InvoiceId, currency: Currency) -> Result<InvoiceItem, PortError> {
    Ok(InvoiceItem {
        id: InvoiceItemId::from(row.id),
        invoice_id,
        product_id: ProductId::from(row.product_id),
        product: ProductSnapshot {
            name: row.product_name,
            barcode: row.product_barcode,
            batch_number: row.batch_number,
            expiry_date: row.expiry_date,
        },
        quantity: to_quantity("quantity", row.quantity)?,
        unit_price: Money::new(row.unit_price, currency),
        discount_amount: Money::new(row.discount_amount, currency),
        discount_percentage: row.discount_percentage,
        line_total: Money::new(row.line_total, currency),
    })
}

/// Maps a domain invoice to its header and line rows
pub fn invoice_to_record(invoice: &Invoice) -> InvoiceRecord {
    let header = InvoiceRow {
        id: invoice.id.into(),
        invoice_number: invoice.invoice_number.clone(),
        customer_name: invoice.customer.name.clone(),
        customer_phone: invoice.customer.phone.clone(),
        customer_email: invoice.customer.email.clone(),
        customer_address: invoice.customer.address.clone(),
        invoice_date: invoice.invoice_date,
        due_date: invoice.due_date,
        currency: invoice.currency.code().to_string(),
        subtotal: invoice.subtotal.amount(),
        discount_amount: invoice.discount_amount.amount(),
        discount_percentage: invoice.discount_percentage,
        tax_amount: invoice.tax_amount.amount(),
        tax_percentage: invoice.tax_percentage,
        total_amount: invoice.total_amount.amount(),
        payment_status: invoice.payment_status.as_str().to_string(),
        payment_method: invoice.payment_method.as_str().to_string(),
        paid_amount: invoice.paid_amount.amount(),
        notes: invoice.notes.clone(),
        is_active: invoice.is_active,
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    };

    let items = invoice
        .items
        .iter()
        .enumerate()
        .map(|(position, item)| InvoiceItemRow {
            id: item.id.into(),
            invoice_id: invoice.id.into(),
            position: position as i32,
            product_id: item.product_id.into(),
            product_name: item.product.name.clone(),
            product_barcode: item.product.barcode.clone(),
            batch_number: item.product.batch_number.clone(),
            expiry_date: item.product.expiry_date,
            quantity: i64::from(item.quantity),
            unit_price: item.unit_price.amount(),
            discount_amount: item.discount_amount.amount(),
            discount_percentage: item.discount_percentage,
            line_total: item.line_total.amount(),
        })
        .collect();

    InvoiceRecord { header, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn sample_invoice() -> Invoice {
        let id = InvoiceId::new_v7();
        let inr = |d| Money::new(d, Currency::INR);
        let now = Utc::now();
        Invoice {
            id,
            invoice_number: "INV000007".to_string(),
            customer: CustomerSnapshot {
                name: "Anita Desai".to_string(),
                phone: Some("+91 98200 00000".to_string()),
                email: None,
                address: None,
            },
            invoice_date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            due_date: None,
            currency: Currency::INR,
            items: vec![InvoiceItem {
                id: InvoiceItemId::new_v7(),
                invoice_id: id,
                product_id: ProductId::new(),
                product: ProductSnapshot {
                    name: "Cough Syrup 100ml".to_string(),
                    barcode: None,
                    batch_number: Some("CS-8".to_string()),
                    expiry_date: NaiveDate::from_ymd_opt(2026, 8, 31),
                },
                quantity: 2,
                unit_price: inr(dec!(85)),
                discount_amount: inr(dec!(10)),
                discount_percentage: None,
                line_total: inr(dec!(160)),
            }],
            subtotal: inr(dec!(160)),
            discount_amount: inr(dec!(0)),
            discount_percentage: None,
            tax_amount: inr(dec!(8)),
            tax_percentage: Some(dec!(5)),
            total_amount: inr(dec!(168)),
            payment_status: PaymentStatus::Pending,
            payment_method: PaymentMethod::Credit,
            paid_amount: inr(dec!(0)),
            notes: Some("deliver tomorrow".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_invoice_record_round_trip() {
        let invoice = sample_invoice();
        let back = record_to_invoice(invoice_to_record(&invoice)).unwrap();
        assert_eq!(back, invoice);
    }

    #[test]
    fn test_items_keep_their_order() {
        let mut invoice = sample_invoice();
        let mut second = invoice.items[0].clone();
        second.id = InvoiceItemId::new_v7();
        second.product.name = "Lozenges".to_string();
        invoice.items.push(second);

        let record = invoice_to_record(&invoice);
        assert_eq!(record.items[0].position, 0);
        assert_eq!(record.items[1].position, 1);
        assert_eq!(record.items[1].product_name, "Lozenges");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut record = invoice_to_record(&sample_invoice());
        record.header.payment_status = "refunded".to_string();
        assert!(matches!(record_to_invoice(record), Err(PortError::Transformation { .. })));
    }
}
