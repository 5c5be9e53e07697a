//! Invoice handlers
//!
//! Thin wrappers over [`domain_invoicing::InvoiceLifecycle`]; every stock
//! effect happens inside the lifecycle.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use core_kernel::InvoiceId;
use domain_invoicing::{InvoiceQuery, InvoiceRequest};

use crate::dto::invoices::*;
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::AppState;

/// Creates an invoice, reserving stock for every item
#[instrument(skip(state, body), fields(customer = %body.customer_name, items = body.items.len()))]
pub async fn create_invoice(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<InvoiceBody>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.lifecycle.create(InvoiceRequest::from(body)).await?;
    Ok(Json(invoice.into()))
}

/// Lists invoices, newest first
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<InvoiceListParams>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let invoices = state.lifecycle.list(InvoiceQuery::from(params)).await?;
    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}

/// Gets an invoice by ID
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.lifecycle.get(InvoiceId::from(id)).await?;
    Ok(Json(invoice.into()))
}

/// Replaces an invoice's contents, moving stock from the old items to the new
#[instrument(skip(state, body), fields(invoice_id = %id))]
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<InvoiceBody>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state
        .lifecycle
        .update(InvoiceId::from(id), InvoiceRequest::from(body))
        .await?;
    Ok(Json(invoice.into()))
}

/// Cancels an invoice and releases its stock
#[instrument(skip(state), fields(invoice_id = %id))]
pub async fn cancel_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.lifecycle.cancel(InvoiceId::from(id)).await?;
    Ok(Json(invoice.into()))
}

/// Overwrites the payment status, no stock effects
#[instrument(skip(state, request), fields(invoice_id = %id, status = %request.status))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state
        .lifecycle
        .update_status(InvoiceId::from(id), request.status, request.paid_amount)
        .await?;
    Ok(Json(invoice.into()))
}
