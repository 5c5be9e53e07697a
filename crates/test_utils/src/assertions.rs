//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful failure
//! messages than bare `assert_eq!`.

use rust_decimal::Decimal;

use core_kernel::{Money, ProductId};
use domain_inventory::StockLedger;
use domain_invoicing::{Invoice, InvoiceError, PaymentStatus};

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {money}");
}

/// Asserts `subtotal = Σ line totals`, `total = subtotal − discount + tax`,
/// each line total is `quantity × unit_price − discount`, and nothing is
/// negative
pub fn assert_invoice_totals(invoice: &Invoice) {
    for item in &invoice.items {
        let expected = item.unit_price.amount() * Decimal::from(item.quantity)
            - item.discount_amount.amount();
        assert_eq!(
            item.line_total.amount(),
            expected,
            "Line total for {} is {}, expected {}",
            item.product.name,
            item.line_total,
            expected
        );
        assert!(!item.line_total.is_negative(), "Negative line total on {}", item.product.name);
    }

    let sum: Decimal = invoice.items.iter().map(|i| i.line_total.amount()).sum();
    assert_eq!(
        invoice.subtotal.amount(),
        sum,
        "Invoice {} subtotal {} does not match line totals {}",
        invoice.invoice_number,
        invoice.subtotal,
        sum
    );

    let total = invoice.subtotal.amount() - invoice.discount_amount.amount() + invoice.tax_amount.amount();
    assert_eq!(
        invoice.total_amount.amount(),
        total,
        "Invoice {} total {} != subtotal - discount + tax ({})",
        invoice.invoice_number,
        invoice.total_amount,
        total
    );
    assert!(!invoice.total_amount.is_negative(), "Negative total on {}", invoice.invoice_number);
    assert!(invoice.totals_consistent());
}

/// Asserts the invoice was cancelled and deactivated
pub fn assert_cancelled(invoice: &Invoice) {
    assert_eq!(
        invoice.payment_status,
        PaymentStatus::Cancelled,
        "Invoice {} is {}, expected cancelled",
        invoice.invoice_number,
        invoice.payment_status
    );
    assert!(!invoice.is_active, "Cancelled invoice {} is still active", invoice.invoice_number);
}

/// Asserts the error is `InsufficientStock` with the given numbers
pub fn assert_insufficient_stock(error: &InvoiceError, requested: u32, available: u32) {
    match error {
        InvoiceError::InsufficientStock {
            requested: r,
            available: a,
            ..
        } => {
            assert_eq!((*r, *a), (requested, available), "Unexpected InsufficientStock numbers");
        }
        other => panic!("Expected InsufficientStock, got {other:?}"),
    }
}

/// Asserts the available quantity of each `(product, expected)` pair
pub async fn assert_stock_levels(ledger: &StockLedger, expected: &[(ProductId, u32)]) {
    for (id, quantity) in expected {
        let actual = match ledger.available(*id).await {
            Ok(actual) => actual,
            Err(e) => panic!("Could not read stock for {id}: {e}"),
        };
        assert_eq!(actual, *quantity, "Available quantity for {id}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;

    #[test]
    fn test_assert_money_zero() {
        assert_money_zero(&Money::zero(Currency::INR));
    }

    #[test]
    #[should_panic(expected = "Expected InsufficientStock")]
    fn test_insufficient_stock_assertion_rejects_other_errors() {
        assert_insufficient_stock(&InvoiceError::validation("nope"), 1, 0);
    }

    #[test]
    fn test_insufficient_stock_assertion_matches_numbers() {
        let error = InvoiceError::InsufficientStock {
            product_id: ProductId::new(),
            product_name: "Amoxicillin 500mg".into(),
            requested: 15,
            available: 10,
        };
        assert_insufficient_stock(&error, 15, 10);
    }
}
