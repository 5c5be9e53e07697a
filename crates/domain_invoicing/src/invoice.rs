//! Invoice aggregate
//!
//! An invoice records a sale: a customer snapshot, ordered line items each
//! pointing at a product, and totals derived from those lines. Totals are
//! always recomputed from the items, never accepted from callers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, InvoiceId, InvoiceItemId, Money, MoneyError, ProductId};
use domain_inventory::ProductSnapshot;

/// Settlement state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing (or not enough) paid yet
    Pending,
    /// Some but not all paid; only produced when partial payments are enabled
    Partial,
    /// Fully settled
    Paid,
    /// Voided; items hold no stock
    Cancelled,
}

impl PaymentStatus {
    /// Derives the status from the paid and total amounts
    ///
    /// `paid >= total` is always `Paid`. Below that the result is `Pending`,
    /// or `Partial` for a positive paid amount when `partial_payments` is on.
    pub fn from_amounts(paid: &Money, total: &Money, partial_payments: bool) -> PaymentStatus {
        if paid.amount() >= total.amount() {
            PaymentStatus::Paid
        } else if partial_payments && paid.is_positive() {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
    #[serde(rename = "netbanking")]
    NetBanking,
    Cheque,
    Credit,
}

impl PaymentMethod {
    /// Methods that settle at the counter, so an invoice without an explicit
    /// paid amount is treated as fully paid
    pub fn is_immediate_settlement(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Cash | PaymentMethod::Card | PaymentMethod::Upi | PaymentMethod::NetBanking
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::NetBanking => "netbanking",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Credit => "credit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "netbanking" => Ok(PaymentMethod::NetBanking),
            "cheque" => Ok(PaymentMethod::Cheque),
            "credit" => Ok(PaymentMethod::Credit),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Customer details copied onto the invoice at the time of sale
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CustomerSnapshot {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A line item on an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// Item ID
    pub id: InvoiceItemId,
    /// Owning invoice
    pub invoice_id: InvoiceId,
    /// Product sold
    pub product_id: ProductId,
    /// Product attributes at the time of sale
    pub product: ProductSnapshot,
    /// Units sold, at least 1
    pub quantity: u32,
    /// Price per unit
    pub unit_price: Money,
    /// Flat discount on the line
    pub discount_amount: Money,
    /// Informational discount percentage
    pub discount_percentage: Option<Decimal>,
    /// `quantity × unit_price − discount_amount`
    pub line_total: Money,
}

impl InvoiceItem {
    /// Computes `quantity × unit_price − discount`
    pub fn compute_line_total(quantity: u32, unit_price: &Money, discount: &Money) -> Result<Money, MoneyError> {
        unit_price.times(quantity)?.checked_sub(discount)
    }
}

/// An invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Human-readable number, e.g. `INV000042`
    pub invoice_number: String,
    /// Customer details
    pub customer: CustomerSnapshot,
    /// Invoice date
    pub invoice_date: NaiveDate,
    /// Optional due date for credit sales
    pub due_date: Option<NaiveDate>,
    /// Currency of every amount on the invoice
    pub currency: Currency,
    /// Line items, in request order
    pub items: Vec<InvoiceItem>,
    /// Sum of line totals
    pub subtotal: Money,
    /// Invoice-level discount
    pub discount_amount: Money,
    /// Informational discount percentage
    pub discount_percentage: Option<Decimal>,
    /// Tax amount
    pub tax_amount: Money,
    /// Informational tax percentage
    pub tax_percentage: Option<Decimal>,
    /// `subtotal − discount_amount + tax_amount`
    pub total_amount: Money,
    /// Settlement state
    pub payment_status: PaymentStatus,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Amount received so far
    pub paid_amount: Money,
    /// Free-text notes
    pub notes: Option<String>,
    /// True while the items hold stock; cleared by cancellation
    pub is_active: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns true if the invoice has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.payment_status == PaymentStatus::Cancelled
    }

    /// Returns true while the invoice's items are counted against stock
    pub fn holds_stock(&self) -> bool {
        self.is_active
    }

    /// Returns true if the invoice is fully paid
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Amount still owed, never below zero
    pub fn balance_due(&self) -> Money {
        match self.total_amount.checked_sub(&self.paid_amount) {
            Ok(balance) if balance.is_positive() => balance,
            _ => Money::zero(self.currency),
        }
    }

    /// Total units across all items
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Checks that the stored totals agree with the items
    pub fn totals_consistent(&self) -> bool {
        let Ok(subtotal) = Money::sum(self.currency, self.items.iter().map(|i| &i.line_total)) else {
            return false;
        };
        let total = subtotal
            .checked_sub(&self.discount_amount)
            .and_then(|m| m.checked_add(&self.tax_amount));
        subtotal == self.subtotal && total.as_ref() == Ok(&self.total_amount)
    }
}
