//! Product records and stock arithmetic

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, ProductId};

/// A single change to a product's available quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "quantity", rename_all = "snake_case")]
pub enum StockChange {
    /// Decrement for a sale; only applied when enough stock is on hand
    Reserve(u32),
    /// Increment reversing an earlier reservation
    Release(u32),
    /// Inbound stock adjustment
    Restock(u32),
}

impl StockChange {
    /// Quantity carried by the change
    pub fn quantity(&self) -> u32 {
        match self {
            StockChange::Reserve(q) | StockChange::Release(q) | StockChange::Restock(q) => *q,
        }
    }
}

/// A product stocked by the pharmacy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Barcode (EAN/UPC), if known
    pub barcode: Option<String>,
    /// Manufacturer batch number
    pub batch_number: Option<String>,
    /// Batch expiry date
    pub expiry_date: Option<NaiveDate>,
    /// Quantity on hand and available for sale
    pub available_quantity: u32,
    /// Threshold at or below which the product counts as low stock
    pub minimum_quantity: u32,
    /// Purchase (cost) price per unit
    pub unit_price: Money,
    /// Default selling price per unit
    pub selling_price: Money,
    /// Last explicit inbound adjustment
    pub last_restocked_at: Option<DateTime<Utc>>,
    /// Whether the product is still sold
    pub is_active: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new active product with no stock on hand
    ///
    /// # Arguments
    ///
    /// * `name` - Display name
    /// * `unit_price` - Purchase price per unit
    /// * `selling_price` - Default selling price per unit
    pub fn new(name: impl Into<String>, unit_price: Money, selling_price: Money) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new_v7(),
            name: name.into(),
            barcode: None,
            batch_number: None,
            expiry_date: None,
            available_quantity: 0,
            minimum_quantity: 0,
            unit_price,
            selling_price,
            last_restocked_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the barcode
    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    /// Sets the batch number and its expiry date
    pub fn with_batch(mut self, batch_number: impl Into<String>, expiry_date: Option<NaiveDate>) -> Self {
        self.batch_number = Some(batch_number.into());
        self.expiry_date = expiry_date;
        self
    }

    /// Sets the opening quantity on hand
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.available_quantity = quantity;
        self
    }

    /// Sets the low-stock threshold
    pub fn with_minimum(mut self, minimum: u32) -> Self {
        self.minimum_quantity = minimum;
        self
    }

    /// Returns true if `quantity` units can be reserved right now
    pub fn can_reserve(&self, quantity: u32) -> bool {
        quantity <= self.available_quantity
    }

    /// Applies a stock change in place
    ///
    /// Returns `false`, leaving the product untouched, when a reservation
    /// exceeds the available quantity. Releases and restocks always apply and
    /// saturate instead of overflowing. Only restocks stamp
    /// `last_restocked_at`.
    pub fn apply_stock_change(&mut self, change: StockChange, now: DateTime<Utc>) -> bool {
        match change {
            StockChange::Reserve(quantity) => {
                if !self.can_reserve(quantity) {
                    return false;
                }
                self.available_quantity -= quantity;
            }
            StockChange::Release(quantity) => {
                self.available_quantity = self.available_quantity.saturating_add(quantity);
            }
            StockChange::Restock(quantity) => {
                self.available_quantity = self.available_quantity.saturating_add(quantity);
                self.last_restocked_at = Some(now);
            }
        }
        self.updated_at = now;
        true
    }

    /// Returns true when the quantity on hand is at or below the minimum
    pub fn is_low_stock(&self) -> bool {
        self.available_quantity <= self.minimum_quantity
    }

    /// Returns true when nothing is on hand
    pub fn is_out_of_stock(&self) -> bool {
        self.available_quantity == 0
    }

    /// Returns true if the batch has expired as of `today`
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < today)
    }

    /// Returns true if the batch expires on or before `today + days`
    pub fn expires_within(&self, days: u32, today: NaiveDate) -> bool {
        let horizon = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        self.expiry_date.is_some_and(|expiry| expiry <= horizon)
    }

    /// Captures the attributes an invoice line keeps after the sale
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            name: self.name.clone(),
            barcode: self.barcode.clone(),
            batch_number: self.batch_number.clone(),
            expiry_date: self.expiry_date,
        }
    }
}

/// Point-in-time copy of product attributes stored on an invoice line
///
/// Later edits to the product never alter a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub barcode: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn paracetamol(quantity: u32) -> Product {
        Product::new(
            "Paracetamol 500mg",
            Money::new(dec!(1.20), Currency::INR),
            Money::new(dec!(2.00), Currency::INR),
        )
        .with_quantity(quantity)
        .with_minimum(2)
    }

    #[test]
    fn test_reserve_within_stock() {
        let mut product = paracetamol(10);
        assert!(product.apply_stock_change(StockChange::Reserve(3), Utc::now()));
        assert_eq!(product.available_quantity, 7);
        assert!(product.last_restocked_at.is_none());
    }

    #[test]
    fn test_reserve_beyond_stock_leaves_product_unchanged() {
        let mut product = paracetamol(10);
        let before = product.clone();
        assert!(!product.apply_stock_change(StockChange::Reserve(15), Utc::now()));
        assert_eq!(product, before);
    }

    #[test]
    fn test_release_does_not_stamp_restock() {
        let mut product = paracetamol(0);
        product.apply_stock_change(StockChange::Release(4), Utc::now());
        assert_eq!(product.available_quantity, 4);
        assert!(product.last_restocked_at.is_none());
    }

    #[test]
    fn test_restock_stamps_timestamp() {
        let mut product = paracetamol(1);
        let now = Utc::now();
        product.apply_stock_change(StockChange::Restock(20), now);
        assert_eq!(product.available_quantity, 21);
        assert_eq!(product.last_restocked_at, Some(now));
    }

    #[test]
    fn test_release_saturates() {
        let mut product = paracetamol(u32::MAX - 1);
        product.apply_stock_change(StockChange::Release(5), Utc::now());
        assert_eq!(product.available_quantity, u32::MAX);
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        assert!(paracetamol(2).is_low_stock());
        assert!(!paracetamol(3).is_low_stock());
        assert!(paracetamol(0).is_out_of_stock());
    }

    #[test]
    fn test_expiry_checks() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let product = paracetamol(5)
            .with_batch("B-17", NaiveDate::from_ymd_opt(2025, 3, 20));

        assert!(!product.is_expired(today));
        assert!(product.expires_within(30, today));
        assert!(!product.expires_within(10, today));
        assert!(product.is_expired(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()));
        assert!(!paracetamol(5).expires_within(365, today));
    }

    #[test]
    fn test_snapshot_copies_identity_fields() {
        let product = paracetamol(5)
            .with_barcode("8901234567890")
            .with_batch("B-17", NaiveDate::from_ymd_opt(2026, 1, 31));
        let snapshot = product.snapshot();

        assert_eq!(snapshot.name, "Paracetamol 500mg");
        assert_eq!(snapshot.barcode.as_deref(), Some("8901234567890"));
        assert_eq!(snapshot.batch_number.as_deref(), Some("B-17"));
        assert_eq!(snapshot.expiry_date, NaiveDate::from_ymd_opt(2026, 1, 31));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use core_kernel::Currency;
    use proptest::prelude::*;

    fn stock_change_strategy() -> impl Strategy<Value = StockChange> {
        prop_oneof![
            (0u32..50).prop_map(StockChange::Reserve),
            (0u32..50).prop_map(StockChange::Release),
            (0u32..50).prop_map(StockChange::Restock),
        ]
    }

    proptest! {
        #[test]
        fn rejected_reserve_never_changes_balance(
            opening in 0u32..100,
            changes in prop::collection::vec(stock_change_strategy(), 0..40)
        ) {
            let mut product = Product::new(
                "Cetirizine 10mg",
                Money::zero(Currency::INR),
                Money::zero(Currency::INR),
            )
            .with_quantity(opening);

            let mut expected = i64::from(opening);
            for change in changes {
                let before = product.available_quantity;
                let applied = product.apply_stock_change(change, Utc::now());
                match change {
                    StockChange::Reserve(q) if !applied => {
                        prop_assert!(q > before);
                        prop_assert_eq!(product.available_quantity, before);
                    }
                    StockChange::Reserve(q) => expected -= i64::from(q),
                    StockChange::Release(q) | StockChange::Restock(q) => expected += i64::from(q),
                }
                prop_assert!(expected >= 0);
                prop_assert_eq!(i64::from(product.available_quantity), expected);
            }
        }
    }
}
