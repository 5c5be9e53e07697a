//! Cross-crate scenarios over the in-memory pharmacy
//!
//! These exercise the inventory and invoicing crates together the way a
//! counter session would, using the shared fixtures and builders.

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::ProductId;
use domain_inventory::ProductQuery;
use domain_invoicing::{InvoiceQuery, PaymentMethod, PaymentStatus};
use test_utils::{
    assert_cancelled, assert_insufficient_stock, assert_invoice_totals, assert_stock_levels, DateFixtures,
    InvoiceRequestBuilder, ProductBuilder, ProductFixtures, TestPharmacy,
};

#[tokio::test]
async fn test_counter_sale_walkthrough() {
    let pharmacy = TestPharmacy::new();
    let amox = pharmacy.stock(ProductFixtures::amoxicillin()).await;

    let invoice = pharmacy
        .lifecycle
        .create(InvoiceRequestBuilder::new().item(amox, 3, dec!(100)).build())
        .await
        .unwrap();

    assert_eq!(invoice.invoice_number, "INV000001");
    assert_eq!(invoice.subtotal.amount(), dec!(300));
    assert_eq!(invoice.total_amount.amount(), dec!(300));
    assert_eq!(invoice.items[0].product.name, "Amoxicillin 500mg");
    assert_eq!(invoice.items[0].product.batch_number.as_deref(), Some("AMX-2406"));
    assert_invoice_totals(&invoice);
    assert_stock_levels(pharmacy.ledger(), &[(amox, 7)]).await;
}

#[tokio::test]
async fn test_mixed_basket_with_discount_and_tax() {
    let pharmacy = TestPharmacy::new();
    let amox = pharmacy.stock(ProductFixtures::amoxicillin()).await;
    let pcm = pharmacy.stock(ProductFixtures::paracetamol()).await;

    let invoice = pharmacy
        .lifecycle
        .create(
            InvoiceRequestBuilder::new()
                .customer("Meera Iyer")
                .phone("+91 90000 11111")
                .discounted_item(amox, 2, dec!(100), dec!(15))
                .item(pcm, 30, dec!(2))
                .discount(dec!(5))
                .tax(dec!(12.50), Some(dec!(5)))
                .payment(PaymentMethod::Card)
                .build(),
        )
        .await
        .unwrap();

    // 185 + 60 = 245; 245 - 5 + 12.50 = 252.50
    assert_eq!(invoice.subtotal.amount(), dec!(245));
    assert_eq!(invoice.total_amount.amount(), dec!(252.50));
    assert_eq!(invoice.payment_status, PaymentStatus::Paid);
    assert_eq!(invoice.paid_amount.amount(), dec!(252.50));
    assert_eq!(invoice.customer.phone.as_deref(), Some("+91 90000 11111"));
    assert_invoice_totals(&invoice);
    assert_stock_levels(pharmacy.ledger(), &[(amox, 8), (pcm, 170)]).await;
}

#[tokio::test]
async fn test_shortage_on_second_line_leaves_everything_untouched() {
    let pharmacy = TestPharmacy::new();
    let pcm = pharmacy.stock(ProductFixtures::paracetamol()).await;
    let insulin = pharmacy.stock(ProductFixtures::insulin()).await;

    let err = pharmacy
        .lifecycle
        .create(
            InvoiceRequestBuilder::new()
                .item(pcm, 20, dec!(2))
                .item(insulin, 4, dec!(815))
                .build(),
        )
        .await
        .unwrap_err();

    assert_insufficient_stock(&err, 4, 3);
    assert_stock_levels(pharmacy.ledger(), &[(pcm, 200), (insulin, 3)]).await;
    assert!(pharmacy.invoices.is_empty().await);

    // the failed attempt consumed no number
    let next = pharmacy
        .lifecycle
        .create(InvoiceRequestBuilder::new().item(pcm, 1, dec!(2)).build())
        .await
        .unwrap();
    assert_eq!(next.invoice_number, "INV000001");
}

#[tokio::test]
async fn test_edit_moves_stock_between_products() {
    let pharmacy = TestPharmacy::new();
    let amox = pharmacy.stock(ProductFixtures::amoxicillin()).await;
    let pcm = pharmacy.stock(ProductFixtures::paracetamol()).await;

    let invoice = pharmacy
        .lifecycle
        .create(InvoiceRequestBuilder::new().item(amox, 4, dec!(100)).build())
        .await
        .unwrap();
    assert_stock_levels(pharmacy.ledger(), &[(amox, 6), (pcm, 200)]).await;

    let edited = pharmacy
        .lifecycle
        .update(
            invoice.id,
            InvoiceRequestBuilder::new()
                .item(amox, 1, dec!(100))
                .item(pcm, 10, dec!(2))
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(edited.invoice_number, invoice.invoice_number);
    assert_eq!(edited.items.len(), 2);
    assert_eq!(edited.total_amount.amount(), dec!(120));
    assert_invoice_totals(&edited);
    assert_stock_levels(pharmacy.ledger(), &[(amox, 9), (pcm, 190)]).await;

    let cancelled = pharmacy.lifecycle.cancel(invoice.id).await.unwrap();
    assert_cancelled(&cancelled);
    assert_stock_levels(pharmacy.ledger(), &[(amox, 10), (pcm, 200)]).await;
}

#[tokio::test]
async fn test_restock_after_sellout_allows_new_sales() {
    let pharmacy = TestPharmacy::new();
    let inhaler = pharmacy.stock(ProductFixtures::out_of_stock()).await;

    let err = pharmacy
        .lifecycle
        .create(InvoiceRequestBuilder::new().item(inhaler, 1, dec!(142.50)).build())
        .await
        .unwrap_err();
    assert_insufficient_stock(&err, 1, 0);

    let restocked = pharmacy.ledger().restock(inhaler, 12).await.unwrap();
    assert_eq!(restocked.available_quantity, 12);
    assert!(restocked.last_restocked_at.is_some());

    pharmacy
        .lifecycle
        .create(InvoiceRequestBuilder::new().item(inhaler, 2, dec!(142.50)).build())
        .await
        .unwrap();

    // sales never stamp the restock time
    let product = pharmacy.ledger().product(inhaler).await.unwrap();
    assert_eq!(product.available_quantity, 10);
    assert_eq!(product.last_restocked_at, restocked.last_restocked_at);
}

#[tokio::test]
async fn test_low_stock_and_expiry_reports() {
    let pharmacy = TestPharmacy::new();
    for product in ProductFixtures::catalog() {
        pharmacy.stock(product).await;
    }
    let amox = ProductFixtures::amoxicillin();
    let amox_id = pharmacy
        .ledger()
        .find(ProductQuery {
            name_contains: Some("amoxicillin".into()),
            ..Default::default()
        })
        .await
        .unwrap()[0]
        .id;

    let low: Vec<String> = pharmacy.ledger().low_stock().await.unwrap().into_iter().map(|p| p.name).collect();
    assert!(low.contains(&"Insulin Glargine 100IU/ml".to_string()));
    assert!(low.contains(&"Salbutamol Inhaler".to_string()));
    assert!(!low.contains(&amox.name));

    // selling amoxicillin down to its minimum makes it low too
    pharmacy
        .lifecycle
        .create(InvoiceRequestBuilder::new().item(amox_id, 8, dec!(100)).build())
        .await
        .unwrap();
    let low = pharmacy.ledger().low_stock().await.unwrap();
    assert!(low.iter().any(|p| p.id == amox_id));

    let expiring = pharmacy
        .ledger()
        .expiring_within(30, DateFixtures::today())
        .await
        .unwrap();
    let names: Vec<&str> = expiring.iter().map(|p| p.name.as_str()).collect();
    assert!(names.contains(&"Insulin Glargine 100IU/ml"));
    assert!(names.contains(&"Cough Syrup 100ml"));
    assert!(!names.contains(&"Paracetamol 500mg"));
}

#[tokio::test]
async fn test_concurrent_counters_share_stock() {
    let pharmacy = std::sync::Arc::new(TestPharmacy::new());
    let pcm = pharmacy
        .stock(ProductBuilder::new("Cetirizine 10mg").quantity(30).build())
        .await;

    let mut handles = Vec::new();
    for counter in 0..12 {
        let pharmacy = pharmacy.clone();
        handles.push(tokio::spawn(async move {
            pharmacy
                .lifecycle
                .create(
                    InvoiceRequestBuilder::new()
                        .customer(format!("Counter {counter}"))
                        .item(pcm, 3, dec!(25))
                        .build(),
                )
                .await
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        if let Ok(invoice) = handle.await.unwrap() {
            numbers.push(invoice.invoice_number);
        }
    }

    assert_eq!(numbers.len(), 10);
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 10);
    assert_eq!(pharmacy.available(pcm).await, 0);
}

#[derive(Debug, Clone)]
enum Action {
    Create(Vec<(usize, u32)>),
    Update(usize, Vec<(usize, u32)>),
    Cancel(usize),
}

fn lines_strategy() -> impl Strategy<Value = Vec<(usize, u32)>> {
    proptest::collection::vec((0usize..3, 1u32..=8), 1..=3)
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        lines_strategy().prop_map(Action::Create),
        (0usize..6, lines_strategy()).prop_map(|(i, lines)| Action::Update(i, lines)),
        (0usize..6).prop_map(Action::Cancel),
    ]
}

/// Stock on hand plus units held by live invoices always equals the
/// opening stock
async fn check_conservation(pharmacy: &TestPharmacy, opening: &HashMap<ProductId, u32>) {
    let invoices = pharmacy.lifecycle.list(InvoiceQuery::default()).await.unwrap();
    let mut held: HashMap<ProductId, u32> = HashMap::new();
    for invoice in invoices.iter().filter(|i| i.holds_stock()) {
        assert_invoice_totals(invoice);
        for item in &invoice.items {
            *held.entry(item.product_id).or_default() += item.quantity;
        }
    }

    for (id, start) in opening {
        let available = pharmacy.available(*id).await;
        assert_eq!(available + held.get(id).copied().unwrap_or(0), *start, "stock leaked for {id}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invoice_actions_conserve_stock(
        levels in proptest::collection::vec(0u32..=20, 3),
        actions in proptest::collection::vec(action_strategy(), 1..20),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let pharmacy = TestPharmacy::new();
            let mut ids = Vec::new();
            let mut opening = HashMap::new();
            for (i, level) in levels.iter().enumerate() {
                let id = pharmacy
                    .stock(ProductBuilder::new(format!("Product {i}")).quantity(*level).build())
                    .await;
                opening.insert(id, *level);
                ids.push(id);
            }

            let request = |lines: &[(usize, u32)]| {
                lines
                    .iter()
                    .fold(InvoiceRequestBuilder::new(), |b, (p, q)| b.item(ids[*p], *q, dec!(10)))
                    .build()
            };

            let mut created = Vec::new();
            for action in &actions {
                match action {
                    Action::Create(lines) => {
                        if let Ok(invoice) = pharmacy.lifecycle.create(request(lines)).await {
                            created.push(invoice.id);
                        }
                    }
                    Action::Update(i, lines) => {
                        if let Some(id) = created.get(*i) {
                            let _ = pharmacy.lifecycle.update(*id, request(lines)).await;
                        }
                    }
                    Action::Cancel(i) => {
                        if let Some(id) = created.get(*i) {
                            pharmacy.lifecycle.cancel(*id).await.unwrap();
                        }
                    }
                }
                check_conservation(&pharmacy, &opening).await;
            }
        });
    }
}
