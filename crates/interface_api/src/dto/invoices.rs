//! Invoice DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Currency, ProductId};
use domain_invoicing::{
    CustomerSnapshot, Invoice, InvoiceItem, InvoiceQuery, InvoiceRequest, LineItemRequest, PaymentMethod,
    PaymentStatus,
};

/// Body of both `POST /invoices` and `PUT /invoices/:id`
#[derive(Debug, Deserialize, Validate)]
pub struct InvoiceBody {
    #[validate(length(min = 1, max = 200, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(length(max = 32))]
    pub customer_phone: Option<String>,
    #[validate(email(message = "Invalid customer email"))]
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub tax_amount: Decimal,
    pub tax_percentage: Option<Decimal>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub paid_amount: Option<Decimal>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "An invoice needs at least one item"), nested)]
    pub items: Vec<LineItemBody>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LineItemBody {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub discount_percentage: Option<Decimal>,
}

impl From<InvoiceBody> for InvoiceRequest {
    fn from(body: InvoiceBody) -> Self {
        InvoiceRequest {
            customer: CustomerSnapshot {
                name: body.customer_name,
                phone: body.customer_phone,
                email: body.customer_email,
                address: body.customer_address,
            },
            invoice_date: body.invoice_date,
            due_date: body.due_date,
            discount_amount: body.discount_amount,
            discount_percentage: body.discount_percentage,
            tax_amount: body.tax_amount,
            tax_percentage: body.tax_percentage,
            payment_method: body.payment_method,
            paid_amount: body.paid_amount,
            notes: body.notes,
            items: body
                .items
                .into_iter()
                .map(|item| {
                    LineItemRequest::new(ProductId::from(item.product_id), item.quantity, item.unit_price)
                        .with_discount(item.discount_amount, item.discount_percentage)
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: PaymentStatus,
    pub paid_amount: Option<Decimal>,
}

/// Query string for `GET /invoices`
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListParams {
    pub status: Option<PaymentStatus>,
    pub active: Option<bool>,
    pub customer: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<InvoiceListParams> for InvoiceQuery {
    fn from(params: InvoiceListParams) -> Self {
        InvoiceQuery {
            status: params.status,
            is_active: params.active,
            customer_name: params.customer,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_barcode: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub line_total: Decimal,
}

impl From<InvoiceItem> for InvoiceItemResponse {
    fn from(item: InvoiceItem) -> Self {
        Self {
            id: item.id.into(),
            product_id: item.product_id.into(),
            product_name: item.product.name,
            product_barcode: item.product.barcode,
            batch_number: item.product.batch_number,
            expiry_date: item.product.expiry_date,
            quantity: item.quantity,
            unit_price: item.unit_price.amount(),
            discount_amount: item.discount_amount.amount(),
            discount_percentage: item.discount_percentage,
            line_total: item.line_total.amount(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: Currency,
    pub items: Vec<InvoiceItemResponse>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub tax_amount: Decimal,
    pub tax_percentage: Option<Decimal>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub paid_amount: Decimal,
    pub balance_due: Decimal,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        let balance_due = invoice.balance_due().amount();
        Self {
            id: invoice.id.into(),
            invoice_number: invoice.invoice_number,
            customer_name: invoice.customer.name,
            customer_phone: invoice.customer.phone,
            customer_email: invoice.customer.email,
            customer_address: invoice.customer.address,
            invoice_date: invoice.invoice_date,
            due_date: invoice.due_date,
            currency: invoice.currency,
            items: invoice.items.into_iter().map(InvoiceItemResponse::from).collect(),
            subtotal: invoice.subtotal.amount(),
            discount_amount: invoice.discount_amount.amount(),
            discount_percentage: invoice.discount_percentage,
            tax_amount: invoice.tax_amount.amount(),
            tax_percentage: invoice.tax_percentage,
            total_amount: invoice.total_amount.amount(),
            payment_status: invoice.payment_status,
            payment_method: invoice.payment_method,
            paid_amount: invoice.paid_amount.amount(),
            balance_due,
            notes: invoice.notes,
            is_active: invoice.is_active,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        }
    }
}
