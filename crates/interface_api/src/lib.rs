//! HTTP API Layer
//!
//! This crate provides the REST API for the pharmacy back office using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for products, stock and invoices
//! - **Extractors**: `ValidatedJson` runs `validator` checks on request bodies
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Domain errors mapped to status codes with a
//!   `{ "error", "message" }` body
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(lifecycle, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_inventory::{ProductRepository, StockLedger};
use domain_invoicing::{InvoiceLifecycle, InvoiceRepository};

use crate::config::ApiConfig;
use crate::handlers::{health, invoices, products};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<InvoiceLifecycle>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(lifecycle: InvoiceLifecycle, config: ApiConfig) -> Self {
        Self {
            lifecycle: Arc::new(lifecycle),
            config,
        }
    }

    /// Wires the lifecycle over the given repositories using the configured
    /// numbering and policy
    pub fn from_repositories(
        products: Arc<dyn ProductRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        config: ApiConfig,
    ) -> Self {
        let lifecycle = InvoiceLifecycle::new(StockLedger::new(products), invoices)
            .with_numbering(config.numbering())
            .with_policy(config.lifecycle_policy());
        Self::new(lifecycle, config)
    }

    /// State backed by the in-memory adapters
    pub fn in_memory(config: ApiConfig) -> Self {
        Self::from_repositories(
            Arc::new(domain_inventory::ports::memory::InMemoryProductRepository::new()),
            Arc::new(domain_invoicing::ports::memory::InMemoryInvoiceRepository::new()),
            config,
        )
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let product_routes = Router::new()
        .route("/", post(products::create_product).get(products::list_products))
        .route("/:id", get(products::get_product))
        .route("/:id/restock", post(products::restock_product));

    let invoice_routes = Router::new()
        .route("/", post(invoices::create_invoice).get(invoices::list_invoices))
        .route("/:id", get(invoices::get_invoice).put(invoices::update_invoice))
        .route("/:id/cancel", post(invoices::cancel_invoice))
        .route("/:id/status", put(invoices::update_status));

    let api_routes = Router::new()
        .nest("/products", product_routes)
        .nest("/invoices", invoice_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
