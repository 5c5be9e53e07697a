//! Pharmacy Core - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # In-memory storage, default configuration
//! cargo run --bin pharmacy-api
//!
//! # PostgreSQL storage
//! API_DATABASE_URL=postgres://localhost/pharmacy cargo run --bin pharmacy-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string; in-memory storage when unset
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_CURRENCY` - Currency code for prices and invoices (default: INR)
//! * `API_INVOICE_PREFIX` / `API_INVOICE_WIDTH` - Invoice number format (default: INV, 6)
//! * `API_PARTIAL_PAYMENTS` - Report `partial` for part-paid invoices (default: false)
//! * `API_REACTIVATE_CANCELLED_ON_EDIT` - Allow editing cancelled invoices (default: true)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresInvoiceAdapter, PostgresProductAdapter};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        currency = %config.currency,
        "Starting Pharmacy Core API Server"
    );

    let state = build_state(config.clone()).await?;
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Picks PostgreSQL when a database URL is configured, otherwise the
/// in-memory adapters.
async fn build_state(config: ApiConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    let Some(url) = config.database_url.clone() else {
        tracing::warn!("No database URL configured, using in-memory storage");
        return Ok(AppState::in_memory(config));
    };

    let pool = create_pool(DatabaseConfig::new(url)).await?;
    run_migrations(&pool).await?;

    Ok(AppState::from_repositories(
        Arc::new(PostgresProductAdapter::new(pool.clone())),
        Arc::new(PostgresInvoiceAdapter::new(pool)),
        config,
    ))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
