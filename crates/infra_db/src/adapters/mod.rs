//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter translates
//! between domain models and row types and turns [`crate::DatabaseError`]
//! into `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresInvoiceAdapter, PostgresProductAdapter};
//!
//! let products: Arc<dyn ProductRepository> = Arc::new(PostgresProductAdapter::new(pool.clone()));
//! let invoices: Arc<dyn InvoiceRepository> = Arc::new(PostgresInvoiceAdapter::new(pool));
//! ```

pub mod product;
pub mod invoice;

pub use product::PostgresProductAdapter;
pub use invoice::PostgresInvoiceAdapter;

use chrono::Utc;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, HealthCheckResult, PortError};

/// Runs `SELECT 1` and reports the outcome under `adapter_id`
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {e}"))),
    };
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}

/// Converts a stored count to `u32`
pub(crate) fn to_quantity(column: &str, value: i64) -> Result<u32, PortError> {
    u32::try_from(value).map_err(|_| PortError::transformation(format!("{column} out of range: {value}")))
}
