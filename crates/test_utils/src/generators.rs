//! Property-Based Test Generators
//!
//! Proptest strategies for stock operations and invoice lines that respect
//! the request invariants (quantity at least 1, non-negative prices, line
//! discounts never above the line amount).

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::ProductId;
use domain_inventory::StockChange;
use domain_invoicing::LineItemRequest;

/// Quantities a counter sale might ask for
pub fn quantity_strategy() -> impl Strategy<Value = u32> {
    1u32..=25
}

/// Opening stock levels, including empty shelves
pub fn stock_level_strategy() -> impl Strategy<Value = u32> {
    0u32..=200
}

/// Prices with two decimal places, 0.01 to 5000.00
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=500_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Percentages with two decimal places, 0.00 to 100.00
pub fn percentage_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|n| Decimal::new(n, 2))
}

/// A reserve, release or restock of up to 50 units
pub fn stock_change_strategy() -> impl Strategy<Value = StockChange> {
    prop_oneof![
        (1u32..=50).prop_map(StockChange::Reserve),
        (1u32..=50).prop_map(StockChange::Release),
        (1u32..=50).prop_map(StockChange::Restock),
    ]
}

/// A line for `product_id` whose discount never exceeds its gross amount
pub fn line_item_strategy(product_id: ProductId) -> impl Strategy<Value = LineItemRequest> {
    (quantity_strategy(), price_strategy(), 0u32..=100).prop_map(move |(quantity, price, discount_pct)| {
        let gross = price * Decimal::from(quantity);
        let discount = (gross * Decimal::from(discount_pct) / Decimal::from(100)).round_dp(2);
        LineItemRequest::new(product_id, quantity, price).with_discount(discount.min(gross), None)
    })
}

/// One line per product, in the given order
pub fn line_items_strategy(product_ids: Vec<ProductId>) -> impl Strategy<Value = Vec<LineItemRequest>> {
    product_ids
        .into_iter()
        .map(line_item_strategy)
        .collect::<Vec<_>>()
}
