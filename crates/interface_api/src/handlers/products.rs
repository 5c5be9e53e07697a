//! Product handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Days, Utc};
use tracing::instrument;
use uuid::Uuid;

use core_kernel::ProductId;
use domain_inventory::ProductQuery;

use crate::dto::products::*;
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::AppState;

/// Registers a product
#[instrument(skip(state, request), fields(name = %request.name))]
pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = request.into_product(state.config.currency);
    let product = state.lifecycle.ledger().register(product).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Lists products, optionally only low-stock or soon-expiring ones
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let expiring_on_or_before = match params.expiring_within_days {
        Some(days) => Some(
            Utc::now()
                .date_naive()
                .checked_add_days(Days::new(u64::from(days)))
                .ok_or_else(|| ApiError::Validation(format!("expiring_within_days out of range: {days}")))?,
        ),
        None => None,
    };

    let query = ProductQuery {
        name_contains: params.name,
        barcode: params.barcode,
        low_stock_only: params.low_stock,
        expiring_on_or_before,
        is_active: params.active,
        limit: params.limit,
        offset: params.offset,
    };

    let products = state.lifecycle.ledger().find(query).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// Gets a product by ID
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.lifecycle.ledger().product(ProductId::from(id)).await?;
    Ok(Json(product.into()))
}

/// Adds inbound stock
#[instrument(skip(state, request), fields(product_id = %id))]
pub async fn restock_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RestockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .lifecycle
        .ledger()
        .restock(ProductId::from(id), request.quantity)
        .await?;
    Ok(Json(product.into()))
}
