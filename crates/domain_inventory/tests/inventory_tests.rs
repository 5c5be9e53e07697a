//! Tests for domain_inventory

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, ProductId};

use domain_inventory::ports::memory::InMemoryProductRepository;
use domain_inventory::{InventoryError, Product, ProductQuery, ProductUpdate, StockLedger};

fn inr(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::INR)
}

fn product(name: &str, quantity: u32) -> Product {
    Product::new(name, inr(dec!(8.00)), inr(dec!(10.00)))
        .with_quantity(quantity)
        .with_minimum(5)
}

async fn ledger_with(products: Vec<Product>) -> StockLedger {
    let repo = InMemoryProductRepository::with_products(products).await;
    StockLedger::new(Arc::new(repo))
}

// ============================================================================
// Reserve / Release / Restock
// ============================================================================

mod stock_tests {
    use super::*;

    #[tokio::test]
    async fn test_reserve_decrements_available() {
        let p = product("Amoxicillin 250mg", 10);
        let ledger = ledger_with(vec![p.clone()]).await;

        let remaining = ledger.reserve(p.id, 3).await.unwrap();
        assert_eq!(remaining, 7);
        assert_eq!(ledger.available(p.id).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_reserve_exact_balance_reaches_zero() {
        let p = product("Amoxicillin 250mg", 4);
        let ledger = ledger_with(vec![p.clone()]).await;

        assert_eq!(ledger.reserve(p.id, 4).await.unwrap(), 0);
        assert!(ledger.product(p.id).await.unwrap().is_out_of_stock());
    }

    #[tokio::test]
    async fn test_reserve_more_than_available_fails_without_change() {
        let p = product("Azithromycin 500mg", 2);
        let ledger = ledger_with(vec![p.clone()]).await;

        let err = ledger.reserve(p.id, 3).await.unwrap_err();
        match err {
            InventoryError::InsufficientStock { product_id, product_name, requested, available } => {
                assert_eq!(product_id, p.id);
                assert_eq!(product_name, "Azithromycin 500mg");
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(ledger.available(p.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reserve_zero_is_validation_error() {
        let p = product("Ibuprofen 400mg", 10);
        let ledger = ledger_with(vec![p.clone()]).await;

        assert!(matches!(
            ledger.reserve(p.id, 0).await,
            Err(InventoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reserve_unknown_product() {
        let ledger = ledger_with(vec![]).await;
        let id = ProductId::new();

        assert!(matches!(
            ledger.reserve(id, 1).await,
            Err(InventoryError::ProductNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_release_restores_without_restock_stamp() {
        let p = product("Metformin 500mg", 10);
        let ledger = ledger_with(vec![p.clone()]).await;

        ledger.reserve(p.id, 6).await.unwrap();
        assert_eq!(ledger.release(p.id, 6).await.unwrap(), 10);

        let stored = ledger.product(p.id).await.unwrap();
        assert!(stored.last_restocked_at.is_none());
    }

    #[tokio::test]
    async fn test_restock_adds_and_stamps() {
        let p = product("Metformin 500mg", 1);
        let ledger = ledger_with(vec![p.clone()]).await;

        let restocked = ledger.restock(p.id, 49).await.unwrap();
        assert_eq!(restocked.available_quantity, 50);
        assert!(restocked.last_restocked_at.is_some());

        assert!(matches!(
            ledger.restock(p.id, 0).await,
            Err(InventoryError::Validation(_))
        ));
    }
}

// ============================================================================
// Queries
// ============================================================================

mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_low_stock_report() {
        let low = product("Losartan 50mg", 5);
        let fine = product("Atorvastatin 10mg", 40);
        let empty = product("Omeprazole 20mg", 0);
        let ledger = ledger_with(vec![low.clone(), fine, empty.clone()]).await;

        let report = ledger.low_stock().await.unwrap();
        let ids: Vec<_> = report.iter().map(|p| p.id).collect();
        assert_eq!(report.len(), 2);
        assert!(ids.contains(&low.id));
        assert!(ids.contains(&empty.id));
    }

    #[tokio::test]
    async fn test_expiring_within_report() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let soon = product("Insulin Glargine", 10)
            .with_batch("INS-01", NaiveDate::from_ymd_opt(2025, 6, 20));
        let later = product("Vitamin D3", 10)
            .with_batch("VD-77", NaiveDate::from_ymd_opt(2026, 1, 1));
        let undated = product("Cotton Roll", 10);
        let ledger = ledger_with(vec![soon.clone(), later, undated]).await;

        let report = ledger.expiring_within(30, today).await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, soon.id);
    }

    #[tokio::test]
    async fn test_find_by_name_and_paginate() {
        let ledger = ledger_with(vec![
            product("Paracetamol 500mg", 10),
            product("Paracetamol 650mg", 10),
            product("Pantoprazole 40mg", 10),
        ])
        .await;

        let query = ProductQuery {
            name_contains: Some("paracetamol".to_string()),
            ..Default::default()
        };
        let found = ledger.find(query.clone()).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "Paracetamol 500mg");

        let page = ledger.find(query.paginate(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Paracetamol 650mg");
    }

    #[tokio::test]
    async fn test_update_details_leaves_stock_alone() {
        let p = product("Cetirizine 10mg", 12);
        let ledger = ledger_with(vec![p.clone()]).await;

        let updated = ledger
            .update_details(
                p.id,
                ProductUpdate {
                    selling_price: Some(inr(dec!(12.50))),
                    minimum_quantity: Some(20),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.selling_price.amount(), dec!(12.50));
        assert_eq!(updated.available_quantity, 12);
        assert!(updated.is_low_stock());
    }

    #[tokio::test]
    async fn test_register_rejects_blank_name() {
        let ledger = ledger_with(vec![]).await;
        let blank = Product::new("  ", inr(dec!(1)), inr(dec!(2)));

        assert!(matches!(
            ledger.register(blank).await,
            Err(InventoryError::Validation(_))
        ));
    }
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_never_oversell() {
        let p = product("Oseltamivir 75mg", 25);
        let ledger = ledger_with(vec![p.clone()]).await;

        let mut handles = Vec::new();
        for _ in 0..40 {
            let ledger = ledger.clone();
            let id = p.id;
            handles.push(tokio::spawn(async move { ledger.reserve(id, 1).await }));
        }

        let mut succeeded = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(InventoryError::InsufficientStock { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(succeeded, 25);
        assert_eq!(rejected, 15);
        assert_eq!(ledger.available(p.id).await.unwrap(), 0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Reserve(u32),
        Release(u32),
        Restock(u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u32..30).prop_map(Op::Reserve),
            (1u32..30).prop_map(Op::Release),
            (1u32..30).prop_map(Op::Restock),
        ]
    }

    proptest! {
        #[test]
        fn ledger_balance_matches_model(
            opening in 0u32..50,
            ops in prop::collection::vec(op_strategy(), 1..30)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let p = product("Salbutamol Inhaler", opening);
                let ledger = ledger_with(vec![p.clone()]).await;
                let mut model = opening;

                for op in ops {
                    match op {
                        Op::Reserve(q) => {
                            let result = ledger.reserve(p.id, q).await;
                            if q <= model {
                                model -= q;
                                prop_assert_eq!(result.unwrap(), model);
                            } else {
                                let is_insufficient = matches!(result, Err(InventoryError::InsufficientStock { .. }));
                                prop_assert!(is_insufficient);
                            }
                        }
                        Op::Release(q) => {
                            model += q;
                            prop_assert_eq!(ledger.release(p.id, q).await.unwrap(), model);
                        }
                        Op::Restock(q) => {
                            model += q;
                            prop_assert_eq!(ledger.restock(p.id, q).await.unwrap().available_quantity, model);
                        }
                    }
                }
                prop_assert_eq!(ledger.available(p.id).await.unwrap(), model);
                Ok(())
            })?;
        }
    }
}
