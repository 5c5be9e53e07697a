//! Invoice lifecycle manager
//!
//! Create, edit, cancel and status changes, each keeping product stock in
//! line with the items of active invoices. `Invoice::is_active` is the
//! marker for "this invoice holds stock": only `cancel` clears it and only
//! an edit sets it again, so a manual status overwrite never desynchronizes
//! the two.
//!
//! Multi-item stock movements are a saga: when any step after the first
//! reservation fails, every movement already made by the call is undone in
//! reverse order before the error is returned. Invoice numbers are assigned
//! last, under a mutex, so a failed create never consumes one.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{Currency, InvoiceId, InvoiceItemId, Money, ProductId};
use domain_inventory::{ProductSnapshot, StockLedger};

use crate::error::InvoiceError;
use crate::invoice::{Invoice, InvoiceItem, PaymentStatus};
use crate::numbering::InvoiceNumbering;
use crate::ports::{InvoiceQuery, InvoiceRepository};
use crate::request::{InvoiceRequest, PricedLine, PricedRequest};

/// Behavioral switches for the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    /// Currency for new invoices
    pub currency: Currency,
    /// Map `0 < paid < total` to `Partial` instead of `Pending`
    pub partial_payments: bool,
    /// Let an edit bring a cancelled invoice back; otherwise it is immutable
    pub reactivate_cancelled_on_edit: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            currency: Currency::INR,
            partial_payments: false,
            reactivate_cancelled_on_edit: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Reservation {
    product_id: ProductId,
    quantity: u32,
}

fn line_reservations(lines: &[PricedLine]) -> Vec<Reservation> {
    lines
        .iter()
        .map(|l| Reservation { product_id: l.product_id, quantity: l.quantity })
        .collect()
}

fn item_reservations(items: &[InvoiceItem]) -> Vec<Reservation> {
    items
        .iter()
        .map(|i| Reservation { product_id: i.product_id, quantity: i.quantity })
        .collect()
}

/// Per-product difference between two sets of holdings, in order of first
/// appearance: `(increases, decreases)`
fn net_changes(old: &[Reservation], new: &[Reservation]) -> (Vec<Reservation>, Vec<Reservation>) {
    let mut deltas: Vec<(ProductId, i64)> = Vec::new();
    let mut add = |product_id: ProductId, quantity: i64| match deltas.iter_mut().find(|(id, _)| *id == product_id) {
        Some((_, delta)) => *delta += quantity,
        None => deltas.push((product_id, quantity)),
    };
    for r in old {
        add(r.product_id, -i64::from(r.quantity));
    }
    for r in new {
        add(r.product_id, i64::from(r.quantity));
    }

    let mut increases = Vec::new();
    let mut decreases = Vec::new();
    for (product_id, delta) in deltas {
        // only an unreservable increase can exceed u32, so saturating is safe
        let quantity = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
        match delta {
            d if d > 0 => increases.push(Reservation { product_id, quantity }),
            d if d < 0 => decreases.push(Reservation { product_id, quantity }),
            _ => {}
        }
    }
    (increases, decreases)
}

/// Orchestrates invoices against the stock ledger
pub struct InvoiceLifecycle {
    ledger: StockLedger,
    invoices: Arc<dyn InvoiceRepository>,
    numbering: InvoiceNumbering,
    policy: LifecyclePolicy,
    // held across "read latest number -> insert"
    number_lock: Mutex<()>,
    // held by edits, cancels and status changes
    edit_lock: Mutex<()>,
}

impl InvoiceLifecycle {
    pub fn new(ledger: StockLedger, invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self {
            ledger,
            invoices,
            numbering: InvoiceNumbering::default(),
            policy: LifecyclePolicy::default(),
            number_lock: Mutex::new(()),
            edit_lock: Mutex::new(()),
        }
    }

    pub fn with_numbering(mut self, numbering: InvoiceNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn ledger(&self) -> &StockLedger {
        &self.ledger
    }

    pub fn invoices(&self) -> &Arc<dyn InvoiceRepository> {
        &self.invoices
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Creates an invoice, reserving stock for every item
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed request (nothing reserved)
    /// - `ProductNotFound` / `InsufficientStock` for the first item that
    ///   cannot be reserved; earlier reservations are released
    /// - `Port` if the invoice cannot be stored; all reservations are released
    #[instrument(skip(self, request), fields(customer = %request.customer.name, items = request.items.len()))]
    pub async fn create(&self, request: InvoiceRequest) -> Result<Invoice, InvoiceError> {
        let currency = self.policy.currency;
        let priced = request.price(currency).inspect_err(|e| warn!(error = %e, "Invoice rejected"))?;
        let reserved = line_reservations(&priced.lines);
        let snapshots = self.reserve_lines(&priced.lines).await?;

        let id = InvoiceId::new_v7();
        let status = self.status_for(&priced);
        let items = build_items(id, &priced.lines, snapshots);

        // timestamps are taken under the lock so creation order matches number order
        let _numbering = self.number_lock.lock().await;
        let latest = match self.invoices.latest_invoice_number().await {
            Ok(latest) => latest,
            Err(e) => {
                self.undo_reservations(&reserved).await;
                return Err(e.into());
            }
        };

        let now = Utc::now();
        let invoice = Invoice {
            id,
            invoice_number: self.numbering.next_after(latest.as_deref()),
            customer: request.customer,
            invoice_date: request.invoice_date.unwrap_or_else(|| now.date_naive()),
            due_date: request.due_date,
            currency,
            items,
            subtotal: priced.subtotal,
            discount_amount: priced.discount_amount,
            discount_percentage: request.discount_percentage,
            tax_amount: priced.tax_amount,
            tax_percentage: request.tax_percentage,
            total_amount: priced.total_amount,
            payment_status: status,
            payment_method: request.payment_method,
            paid_amount: priced.paid_amount,
            notes: request.notes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.invoices.insert_invoice(&invoice).await {
            error!(error = %e, "Failed to store invoice");
            self.undo_reservations(&reserved).await;
            return Err(e.into());
        }

        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total = %invoice.total_amount,
            status = %invoice.payment_status,
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Replaces the items and amounts of an existing invoice
    ///
    /// The invoice keeps its id, number and creation time. Stock moves by the
    /// per-product difference between the old and new items: increases are
    /// reserved before any decrease is released, so stock freed by the edit
    /// only becomes visible once the edit can no longer fail on a reservation.
    /// On failure stock is put back exactly as it was.
    #[instrument(skip(self, request), fields(invoice_id = %id))]
    pub async fn update(&self, id: InvoiceId, request: InvoiceRequest) -> Result<Invoice, InvoiceError> {
        let _edit = self.edit_lock.lock().await;
        let current = self.get(id).await?;

        let was_cancelled = current.is_cancelled();
        if current.is_paid() || (was_cancelled && !self.policy.reactivate_cancelled_on_edit) {
            warn!(invoice_number = %current.invoice_number, status = %current.payment_status, "Edit rejected");
            return Err(InvoiceError::InvoiceImmutable {
                invoice_number: current.invoice_number,
                status: current.payment_status,
            });
        }

        let priced = request.price(current.currency).inspect_err(|e| warn!(error = %e, "Edit rejected"))?;
        let snapshots = self.snapshot_lines(&priced.lines).await?;

        let reactivated = !current.holds_stock();
        let old = if reactivated { Vec::new() } else { item_reservations(&current.items) };
        let (increases, decreases) = net_changes(&old, &line_reservations(&priced.lines));
        debug!(increases = increases.len(), decreases = decreases.len(), "Applying edit stock changes");

        self.reserve_all(&increases).await?;
        if let Err(e) = self.release_or_restore(&decreases).await {
            self.undo_reservations(&increases).await;
            return Err(e);
        }

        let status = self.status_for(&priced);
        let updated = Invoice {
            id: current.id,
            invoice_number: current.invoice_number,
            customer: request.customer,
            invoice_date: request.invoice_date.unwrap_or(current.invoice_date),
            due_date: request.due_date,
            currency: current.currency,
            items: build_items(current.id, &priced.lines, snapshots),
            subtotal: priced.subtotal,
            discount_amount: priced.discount_amount,
            discount_percentage: request.discount_percentage,
            tax_amount: priced.tax_amount,
            tax_percentage: request.tax_percentage,
            total_amount: priced.total_amount,
            payment_status: status,
            payment_method: request.payment_method,
            paid_amount: priced.paid_amount,
            notes: request.notes,
            is_active: true,
            created_at: current.created_at,
            updated_at: Utc::now(),
        };

        if let Err(e) = self.invoices.replace_invoice(&updated).await {
            error!(error = %e, "Failed to store edited invoice");
            self.redo_reservations(&decreases).await;
            self.undo_reservations(&increases).await;
            return Err(InvoiceError::from_port(id, e));
        }

        info!(
            invoice_number = %updated.invoice_number,
            total = %updated.total_amount,
            status = %updated.payment_status,
            reactivated,
            "Invoice updated"
        );
        Ok(updated)
    }

    /// Cancels an invoice and releases the stock it holds
    ///
    /// Cancelling an already cancelled invoice returns it unchanged. An
    /// invoice marked cancelled through [`Self::update_status`] still holds
    /// its stock, which is released here.
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn cancel(&self, id: InvoiceId) -> Result<Invoice, InvoiceError> {
        let _edit = self.edit_lock.lock().await;
        let current = self.get(id).await?;
        if current.is_cancelled() && !current.holds_stock() {
            debug!(invoice_number = %current.invoice_number, "Invoice already cancelled");
            return Ok(current);
        }

        let held = if current.holds_stock() { item_reservations(&current.items) } else { Vec::new() };
        self.release_or_restore(&held).await?;

        let mut cancelled = current;
        cancelled.payment_status = PaymentStatus::Cancelled;
        cancelled.is_active = false;
        cancelled.updated_at = Utc::now();

        if let Err(e) = self.invoices.replace_invoice(&cancelled).await {
            error!(error = %e, "Failed to store cancelled invoice");
            self.redo_reservations(&held).await;
            return Err(InvoiceError::from_port(id, e));
        }

        info!(invoice_number = %cancelled.invoice_number, items = held.len(), "Invoice cancelled");
        Ok(cancelled)
    }

    /// Overwrites status and, optionally, the paid amount
    ///
    /// A manual correction path: no stock moves, `is_active` is left alone
    /// and the paid amount is not checked against the total. Setting
    /// `Cancelled` here does not release stock; [`Self::cancel`] does.
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn update_status(
        &self,
        id: InvoiceId,
        status: PaymentStatus,
        paid_amount: Option<Decimal>,
    ) -> Result<Invoice, InvoiceError> {
        if let Some(paid) = paid_amount {
            if paid.is_sign_negative() && !paid.is_zero() {
                return Err(InvoiceError::validation("paid_amount cannot be negative"));
            }
        }

        let _edit = self.edit_lock.lock().await;
        let mut invoice = self.get(id).await?;
        let previous = invoice.payment_status;

        invoice.payment_status = status;
        if let Some(paid) = paid_amount {
            invoice.paid_amount = Money::new(paid, invoice.currency);
        }
        invoice.updated_at = Utc::now();

        self.invoices
            .replace_invoice(&invoice)
            .await
            .map_err(|e| InvoiceError::from_port(id, e))?;

        info!(
            invoice_number = %invoice.invoice_number,
            from = %previous,
            to = %status,
            paid = %invoice.paid_amount,
            "Invoice status updated"
        );
        Ok(invoice)
    }

    /// Fetches an invoice with its items
    pub async fn get(&self, id: InvoiceId) -> Result<Invoice, InvoiceError> {
        self.invoices
            .get_invoice(id)
            .await
            .map_err(|e| InvoiceError::from_port(id, e))
    }

    /// Lists invoices, newest first
    pub async fn list(&self, query: InvoiceQuery) -> Result<Vec<Invoice>, InvoiceError> {
        Ok(self.invoices.find_invoices(query).await?)
    }

    fn status_for(&self, priced: &PricedRequest) -> PaymentStatus {
        PaymentStatus::from_amounts(&priced.paid_amount, &priced.total_amount, self.policy.partial_payments)
    }

    /// Looks up and reserves each line in order, returning the product
    /// snapshots. On failure everything reserved so far is released.
    async fn reserve_lines(&self, lines: &[PricedLine]) -> Result<Vec<ProductSnapshot>, InvoiceError> {
        let mut snapshots = Vec::with_capacity(lines.len());
        let mut done = Vec::with_capacity(lines.len());

        for line in lines {
            let step = async {
                let product = self.ledger.product(line.product_id).await?;
                self.ledger.reserve(line.product_id, line.quantity).await?;
                Ok::<_, InvoiceError>(product.snapshot())
            };
            match step.await {
                Ok(snapshot) => {
                    snapshots.push(snapshot);
                    done.push(Reservation { product_id: line.product_id, quantity: line.quantity });
                }
                Err(e) => {
                    warn!(product_id = %line.product_id, error = %e, "Reservation failed");
                    self.undo_reservations(&done).await;
                    return Err(e);
                }
            }
        }
        Ok(snapshots)
    }

    /// Looks up every line's product without moving stock
    async fn snapshot_lines(&self, lines: &[PricedLine]) -> Result<Vec<ProductSnapshot>, InvoiceError> {
        let mut snapshots = Vec::with_capacity(lines.len());
        for line in lines {
            snapshots.push(self.ledger.product(line.product_id).await?.snapshot());
        }
        Ok(snapshots)
    }

    /// Reserves each quantity in order; on failure releases what was already
    /// reserved and returns the error
    async fn reserve_all(&self, wanted: &[Reservation]) -> Result<(), InvoiceError> {
        for (index, r) in wanted.iter().enumerate() {
            if let Err(e) = self.ledger.reserve(r.product_id, r.quantity).await {
                warn!(product_id = %r.product_id, error = %e, "Reservation failed");
                self.undo_reservations(&wanted[..index]).await;
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Releases each reservation in order; on failure re-reserves whatever was
    /// already released and returns the error
    async fn release_or_restore(&self, held: &[Reservation]) -> Result<(), InvoiceError> {
        for (index, r) in held.iter().enumerate() {
            if let Err(e) = self.ledger.release(r.product_id, r.quantity).await {
                error!(product_id = %r.product_id, error = %e, "Release failed");
                self.redo_reservations(&held[..index]).await;
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Compensation: releases reservations in reverse order
    async fn undo_reservations(&self, reserved: &[Reservation]) {
        for r in reserved.iter().rev() {
            if let Err(e) = self.ledger.release(r.product_id, r.quantity).await {
                error!(product_id = %r.product_id, quantity = r.quantity, error = %e, "Compensating release failed");
            }
        }
    }

    /// Compensation: reserves previously released quantities again, in reverse order
    async fn redo_reservations(&self, released: &[Reservation]) {
        for r in released.iter().rev() {
            if let Err(e) = self.ledger.reserve(r.product_id, r.quantity).await {
                error!(product_id = %r.product_id, quantity = r.quantity, error = %e, "Compensating reservation failed");
            }
        }
    }
}

fn build_items(invoice_id: InvoiceId, lines: &[PricedLine], snapshots: Vec<ProductSnapshot>) -> Vec<InvoiceItem> {
    lines
        .iter()
        .zip(snapshots)
        .map(|(line, product)| InvoiceItem {
            id: InvoiceItemId::new_v7(),
            invoice_id,
            product_id: line.product_id,
            product,
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount_amount: line.discount_amount,
            discount_percentage: line.discount_percentage,
            line_total: line.line_total,
        })
        .collect()
}

impl std::fmt::Debug for InvoiceLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceLifecycle")
            .field("numbering", &self.numbering)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
