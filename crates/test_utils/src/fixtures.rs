//! Pre-built Test Fixtures
//!
//! Sample pharmacy stock and a fully wired in-memory pharmacy. The data is
//! fixed so assertions can use literal numbers.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, ProductId};
use domain_inventory::ports::memory::InMemoryProductRepository;
use domain_inventory::{Product, StockLedger};
use domain_invoicing::ports::memory::InMemoryInvoiceRepository;
use domain_invoicing::{InvoiceLifecycle, LifecyclePolicy};

use crate::builders::ProductBuilder;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn inr(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    pub fn inr_100() -> Money {
        Money::new(dec!(100.00), Currency::INR)
    }

    pub fn inr_zero() -> Money {
        Money::zero(Currency::INR)
    }
}

/// Fixed calendar dates
pub struct DateFixtures;

impl DateFixtures {
    /// "Today" for expiry checks
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default()
    }

    /// A batch that expired last month
    pub fn expired() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 15).unwrap_or_default()
    }

    /// Expires within 30 days of [`DateFixtures::today`]
    pub fn expiring_soon() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap_or_default()
    }

    /// Comfortably in date
    pub fn long_dated() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 12, 31).unwrap_or_default()
    }
}

/// Sample pharmacy products
pub struct ProductFixtures;

impl ProductFixtures {
    /// 10 on hand, minimum 2, sells at 100
    pub fn amoxicillin() -> Product {
        ProductBuilder::new("Amoxicillin 500mg")
            .barcode("8901234500017")
            .batch("AMX-2406", Some(DateFixtures::long_dated()))
            .prices(dec!(62.00), dec!(100.00))
            .quantity(10)
            .minimum(2)
            .build()
    }

    /// 200 on hand, minimum 50, sells at 2
    pub fn paracetamol() -> Product {
        ProductBuilder::new("Paracetamol 500mg")
            .barcode("8901234500024")
            .batch("PCM-1187", Some(DateFixtures::long_dated()))
            .prices(dec!(1.10), dec!(2.00))
            .quantity(200)
            .minimum(50)
            .build()
    }

    /// 3 on hand, minimum 5: already low
    pub fn insulin() -> Product {
        ProductBuilder::new("Insulin Glargine 100IU/ml")
            .batch("INS-0031", Some(DateFixtures::expiring_soon()))
            .prices(dec!(640.00), dec!(815.00))
            .quantity(3)
            .minimum(5)
            .build()
    }

    /// 40 on hand, past its expiry date
    pub fn expired_syrup() -> Product {
        ProductBuilder::new("Cough Syrup 100ml")
            .batch("CS-0099", Some(DateFixtures::expired()))
            .prices(dec!(48.00), dec!(85.00))
            .quantity(40)
            .minimum(10)
            .build()
    }

    /// Nothing on hand
    pub fn out_of_stock() -> Product {
        ProductBuilder::new("Salbutamol Inhaler")
            .prices(dec!(95.00), dec!(142.50))
            .quantity(0)
            .minimum(4)
            .build()
    }

    pub fn catalog() -> Vec<Product> {
        vec![
            Self::amoxicillin(),
            Self::paracetamol(),
            Self::insulin(),
            Self::expired_syrup(),
            Self::out_of_stock(),
        ]
    }
}

/// A lifecycle over fresh in-memory repositories
pub struct TestPharmacy {
    pub lifecycle: InvoiceLifecycle,
    pub products: InMemoryProductRepository,
    pub invoices: InMemoryInvoiceRepository,
}

impl TestPharmacy {
    pub fn new() -> Self {
        Self::with_policy(LifecyclePolicy::default())
    }

    pub fn with_policy(policy: LifecyclePolicy) -> Self {
        let products = InMemoryProductRepository::new();
        let invoices = InMemoryInvoiceRepository::new();
        let lifecycle = InvoiceLifecycle::new(
            StockLedger::new(Arc::new(products.clone())),
            Arc::new(invoices.clone()),
        )
        .with_policy(policy);
        Self {
            lifecycle,
            products,
            invoices,
        }
    }

    pub fn ledger(&self) -> &StockLedger {
        self.lifecycle.ledger()
    }

    /// Registers `product` and returns its id
    pub async fn stock(&self, product: Product) -> ProductId {
        let id = product.id;
        if let Err(e) = self.ledger().register(product).await {
            panic!("failed to register fixture product: {e}");
        }
        id
    }

    pub async fn available(&self, id: ProductId) -> u32 {
        match self.ledger().available(id).await {
            Ok(quantity) => quantity,
            Err(e) => panic!("failed to read stock for {id}: {e}"),
        }
    }
}

impl Default for TestPharmacy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_states() {
        let today = DateFixtures::today();
        assert!(!ProductFixtures::amoxicillin().is_low_stock());
        assert!(ProductFixtures::insulin().is_low_stock());
        assert!(ProductFixtures::insulin().expires_within(30, today));
        assert!(ProductFixtures::expired_syrup().is_expired(today));
        assert!(ProductFixtures::out_of_stock().is_out_of_stock());
    }

    #[tokio::test]
    async fn test_pharmacy_shares_repositories() {
        let pharmacy = TestPharmacy::new();
        let id = pharmacy.stock(ProductFixtures::amoxicillin()).await;

        assert_eq!(pharmacy.products.len().await, 1);
        assert_eq!(pharmacy.available(id).await, 10);
        assert!(pharmacy.invoices.is_empty().await);
    }
}
