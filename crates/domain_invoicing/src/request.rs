//! Invoice requests and their pricing
//!
//! A request describes the desired state of an invoice. [`InvoiceRequest::price`]
//! validates it and computes every amount before any stock is touched, so a
//! request that would produce a negative line or invoice total never reaches
//! the stock ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, ProductId};

use crate::error::InvoiceError;
use crate::invoice::{CustomerSnapshot, InvoiceItem, PaymentMethod};

/// One requested line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
}

impl LineItemRequest {
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
            discount_amount: Decimal::ZERO,
            discount_percentage: None,
        }
    }

    pub fn with_discount(mut self, amount: Decimal, percentage: Option<Decimal>) -> Self {
        self.discount_amount = amount;
        self.discount_percentage = percentage;
        self
    }
}

/// Desired state of an invoice, for both create and edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub customer: CustomerSnapshot,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub tax_percentage: Option<Decimal>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Explicit amount received; only a positive value counts
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<LineItemRequest>,
}

impl InvoiceRequest {
    /// A cash sale to `customer_name` with the given lines
    pub fn new(customer_name: impl Into<String>, items: Vec<LineItemRequest>) -> Self {
        Self {
            customer: CustomerSnapshot::named(customer_name),
            invoice_date: None,
            due_date: None,
            discount_amount: Decimal::ZERO,
            discount_percentage: None,
            tax_amount: Decimal::ZERO,
            tax_percentage: None,
            payment_method: PaymentMethod::Cash,
            paid_amount: None,
            notes: None,
            items,
        }
    }

    pub fn with_payment(mut self, method: PaymentMethod, paid_amount: Option<Decimal>) -> Self {
        self.payment_method = method;
        self.paid_amount = paid_amount;
        self
    }

    pub fn with_discount(mut self, amount: Decimal, percentage: Option<Decimal>) -> Self {
        self.discount_amount = amount;
        self.discount_percentage = percentage;
        self
    }

    pub fn with_tax(mut self, amount: Decimal, percentage: Option<Decimal>) -> Self {
        self.tax_amount = amount;
        self.tax_percentage = percentage;
        self
    }

    /// Validates the request and computes all amounts in `currency`
    pub fn price(&self, currency: Currency) -> Result<PricedRequest, InvoiceError> {
        if self.customer.name.trim().is_empty() {
            return Err(InvoiceError::validation("Customer name is required"));
        }
        if self.items.is_empty() {
            return Err(InvoiceError::validation("An invoice needs at least one item"));
        }
        non_negative("discount_amount", self.discount_amount)?;
        non_negative("tax_amount", self.tax_amount)?;
        percentage("discount_percentage", self.discount_percentage)?;
        percentage("tax_percentage", self.tax_percentage)?;
        if let (Some(invoice_date), Some(due_date)) = (self.invoice_date, self.due_date) {
            if due_date < invoice_date {
                return Err(InvoiceError::validation("Due date cannot precede the invoice date"));
            }
        }

        let mut lines = Vec::with_capacity(self.items.len());
        for (index, item) in self.items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(InvoiceError::validation(format!("Item {}: quantity must be at least 1", index + 1)));
            }
            non_negative(&format!("items[{index}].unit_price"), item.unit_price)?;
            non_negative(&format!("items[{index}].discount_amount"), item.discount_amount)?;
            percentage(&format!("items[{index}].discount_percentage"), item.discount_percentage)?;

            let unit_price = Money::new(item.unit_price, currency);
            let discount_amount = Money::new(item.discount_amount, currency);
            let line_total = InvoiceItem::compute_line_total(item.quantity, &unit_price, &discount_amount)?;
            if line_total.is_negative() {
                return Err(InvoiceError::validation(format!(
                    "Item {}: discount exceeds the line amount",
                    index + 1
                )));
            }

            lines.push(PricedLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price,
                discount_amount,
                discount_percentage: item.discount_percentage,
                line_total,
            });
        }

        let subtotal = Money::sum(currency, lines.iter().map(|l| &l.line_total))?;
        let discount_amount = Money::new(self.discount_amount, currency);
        let tax_amount = Money::new(self.tax_amount, currency);
        let total_amount = subtotal.checked_sub(&discount_amount)?.checked_add(&tax_amount)?;
        if total_amount.is_negative() {
            return Err(InvoiceError::validation("Discount exceeds the invoice amount"));
        }

        let paid_amount = match self.paid_amount {
            Some(paid) if paid.is_sign_negative() && !paid.is_zero() => {
                return Err(InvoiceError::validation("paid_amount cannot be negative"));
            }
            Some(paid) if !paid.is_zero() => Money::new(paid, currency),
            _ if self.payment_method.is_immediate_settlement() => total_amount,
            _ => Money::zero(currency),
        };

        Ok(PricedRequest {
            lines,
            subtotal,
            discount_amount,
            tax_amount,
            total_amount,
            paid_amount,
        })
    }
}

/// A validated line with its computed total
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub discount_amount: Money,
    pub discount_percentage: Option<Decimal>,
    pub line_total: Money,
}

/// A validated request with every amount computed
#[derive(Debug, Clone, PartialEq)]
pub struct PricedRequest {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub paid_amount: Money,
}

fn non_negative(field: &str, value: Decimal) -> Result<(), InvoiceError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(InvoiceError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

fn percentage(field: &str, value: Option<Decimal>) -> Result<(), InvoiceError> {
    match value {
        Some(p) if p < Decimal::ZERO || p > Decimal::ONE_HUNDRED => Err(InvoiceError::validation(
            format!("{field} must be between 0 and 100"),
        )),
        _ => Ok(()),
    }
}
