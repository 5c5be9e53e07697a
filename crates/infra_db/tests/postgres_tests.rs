//! PostgreSQL adapter tests
//!
//! These run against a live database named by `TEST_DATABASE_URL` and are
//! skipped when it is unset. Each test works on freshly created products so
//! runs do not interfere with each other.

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, PortError};
use domain_inventory::{Product, ProductRepository, StockChange, StockChangeOutcome, StockLedger};
use domain_invoicing::{
    InvoiceError, InvoiceLifecycle, InvoiceNumbering, InvoiceRepository, InvoiceRequest, LineItemRequest,
};
use infra_db::{create_pool, run_migrations, DatabaseConfig, DatabasePool, PostgresInvoiceAdapter, PostgresProductAdapter};

async fn pool() -> Option<DatabasePool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = create_pool(DatabaseConfig::new(url).max_connections(8).min_connections(1))
        .await
        .expect("connect to TEST_DATABASE_URL");
    run_migrations(&pool).await.expect("migrations");
    Some(pool)
}

fn product(quantity: u32) -> Product {
    Product::new(
        "Integration Test Tablet",
        Money::new(dec!(4.00), Currency::INR),
        Money::new(dec!(6.50), Currency::INR),
    )
    .with_quantity(quantity)
}

#[tokio::test]
async fn test_conditional_decrement() {
    let Some(pool) = pool().await else { return };
    let adapter = PostgresProductAdapter::new(pool);
    let p = adapter.create_product(product(5)).await.unwrap();

    let applied = adapter.apply_stock_change(p.id, StockChange::Reserve(3)).await.unwrap();
    assert!(applied.is_applied());
    assert_eq!(applied.product().available_quantity, 2);

    let rejected = adapter.apply_stock_change(p.id, StockChange::Reserve(3)).await.unwrap();
    assert!(matches!(rejected, StockChangeOutcome::Rejected(ref prod) if prod.available_quantity == 2));

    let restocked = adapter.apply_stock_change(p.id, StockChange::Restock(10)).await.unwrap();
    assert_eq!(restocked.product().available_quantity, 12);
    assert!(restocked.product().last_restocked_at.is_some());
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let Some(pool) = pool().await else { return };
    let adapter = PostgresProductAdapter::new(pool);

    let err = adapter
        .apply_stock_change(core_kernel::ProductId::new(), StockChange::Reserve(1))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotFound { .. }));
}

#[tokio::test]
async fn test_concurrent_reservations_never_oversell() {
    let Some(pool) = pool().await else { return };
    let adapter = Arc::new(PostgresProductAdapter::new(pool));
    let p = adapter.create_product(product(10)).await.unwrap();
    let ledger = StockLedger::new(adapter.clone());

    let mut handles = Vec::new();
    for _ in 0..25 {
        let ledger = ledger.clone();
        let id = p.id;
        handles.push(tokio::spawn(async move { ledger.reserve(id, 1).await }));
    }
    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(ledger.available(p.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_lifecycle_against_postgres() {
    let Some(pool) = pool().await else { return };
    let products = Arc::new(PostgresProductAdapter::new(pool.clone()));
    let invoices = Arc::new(PostgresInvoiceAdapter::new(pool));
    let p = products.create_product(product(10)).await.unwrap();
    let lifecycle = InvoiceLifecycle::new(StockLedger::new(products), invoices.clone());

    let invoice = lifecycle
        .create(InvoiceRequest::new("Integration", vec![LineItemRequest::new(p.id, 4, dec!(6.50))]))
        .await
        .unwrap();
    assert_eq!(lifecycle.ledger().available(p.id).await.unwrap(), 6);

    let stored = invoices.get_invoice(invoice.id).await.unwrap();
    assert_eq!(stored.invoice_number, invoice.invoice_number);
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.total_amount.amount(), dec!(26.00));

    let err = lifecycle
        .create(InvoiceRequest::new("Integration", vec![LineItemRequest::new(p.id, 40, dec!(6.50))]))
        .await
        .unwrap_err();
    assert!(matches!(err, InvoiceError::InsufficientStock { .. }));
    assert_eq!(lifecycle.ledger().available(p.id).await.unwrap(), 6);

    lifecycle.cancel(invoice.id).await.unwrap();
    assert_eq!(lifecycle.ledger().available(p.id).await.unwrap(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_keep_numbering_moving() {
    let Some(pool) = pool().await else { return };
    let products = Arc::new(PostgresProductAdapter::new(pool.clone()));
    let invoices = Arc::new(PostgresInvoiceAdapter::new(pool));
    let p = products.create_product(product(100)).await.unwrap();

    // a prefix of its own so other suites writing invoices cannot collide
    let prefix = format!("T{}", &uuid::Uuid::new_v4().simple().to_string()[..6]);
    let lifecycle = Arc::new(
        InvoiceLifecycle::new(StockLedger::new(products), invoices.clone())
            .with_numbering(InvoiceNumbering::new(prefix.clone(), 8)),
    );

    let mut handles = Vec::new();
    for _ in 0..16 {
        let lifecycle = Arc::clone(&lifecycle);
        let id = p.id;
        handles.push(tokio::spawn(async move {
            lifecycle
                .create(InvoiceRequest::new("Integration", vec![LineItemRequest::new(id, 1, dec!(6.50))]))
                .await
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().invoice_number);
    }
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 16);

    let next = lifecycle
        .create(InvoiceRequest::new("Integration", vec![LineItemRequest::new(p.id, 1, dec!(6.50))]))
        .await
        .unwrap();
    assert!(next.invoice_number.starts_with(&prefix));
    assert!(!numbers.contains(&next.invoice_number));
    assert_eq!(lifecycle.ledger().available(p.id).await.unwrap(), 83);
}
