//! Invoicing Domain Ports
//!
//! [`InvoiceRepository`] persists whole invoice aggregates. Adapters write the
//! header and its items together: a failed write leaves neither behind.

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, InvoiceId, PortError};

use crate::invoice::{Invoice, PaymentStatus};

/// Query parameters for listing invoices
#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    /// Filter by payment status
    pub status: Option<PaymentStatus>,
    /// Filter by active flag
    pub is_active: Option<bool>,
    /// Case-insensitive substring match on the customer name
    pub customer_name: Option<String>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl InvoiceQuery {
    /// Invoices in `status`
    pub fn by_status(status: PaymentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Returns true if `invoice` satisfies every filter set on the query
    pub fn matches(&self, invoice: &Invoice) -> bool {
        if let Some(status) = self.status {
            if invoice.payment_status != status {
                return false;
            }
        }
        if let Some(is_active) = self.is_active {
            if invoice.is_active != is_active {
                return false;
            }
        }
        if let Some(ref name) = self.customer_name {
            if !invoice.customer.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Storage port for invoices
#[async_trait]
pub trait InvoiceRepository: DomainPort + HealthCheckable {
    /// Retrieves an invoice with its items, or `PortError::NotFound`
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// Number of the most recently created invoice, if any
    async fn latest_invoice_number(&self) -> Result<Option<String>, PortError>;

    /// Stores a new invoice; `PortError::Conflict` if its number is taken
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Replaces the header and the full item list of an existing invoice
    async fn replace_invoice(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Lists invoices matching the query, newest first
    async fn find_invoices(&self, query: InvoiceQuery) -> Result<Vec<Invoice>, PortError>;
}

/// In-memory invoice storage
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default)]
    struct Store {
        invoices: HashMap<InvoiceId, Invoice>,
        // insertion order, oldest first
        order: Vec<InvoiceId>,
    }

    /// HashMap-backed implementation of [`InvoiceRepository`]
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryInvoiceRepository {
        store: Arc<RwLock<Store>>,
    }

    impl InMemoryInvoiceRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of stored invoices
        pub async fn len(&self) -> usize {
            self.store.read().await.order.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.store.read().await.order.is_empty()
        }
    }

    impl DomainPort for InMemoryInvoiceRepository {}

    #[async_trait]
    impl HealthCheckable for InMemoryInvoiceRepository {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-invoices")
        }
    }

    #[async_trait]
    impl InvoiceRepository for InMemoryInvoiceRepository {
        async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
            self.store
                .read()
                .await
                .invoices
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", id))
        }

        async fn latest_invoice_number(&self) -> Result<Option<String>, PortError> {
            let store = self.store.read().await;
            Ok(store
                .order
                .last()
                .and_then(|id| store.invoices.get(id))
                .map(|invoice| invoice.invoice_number.clone()))
        }

        async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
            let mut store = self.store.write().await;
            if store.invoices.contains_key(&invoice.id) {
                return Err(PortError::conflict(format!("Invoice {} already exists", invoice.id)));
            }
            if store
                .invoices
                .values()
                .any(|existing| existing.invoice_number == invoice.invoice_number)
            {
                return Err(PortError::conflict(format!(
                    "Invoice number {} already exists",
                    invoice.invoice_number
                )));
            }
            store.order.push(invoice.id);
            store.invoices.insert(invoice.id, invoice.clone());
            Ok(())
        }

        async fn replace_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
            let mut store = self.store.write().await;
            let existing = store
                .invoices
                .get_mut(&invoice.id)
                .ok_or_else(|| PortError::not_found("Invoice", invoice.id))?;
            *existing = invoice.clone();
            Ok(())
        }

        async fn find_invoices(&self, query: InvoiceQuery) -> Result<Vec<Invoice>, PortError> {
            let store = self.store.read().await;
            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);

            Ok(store
                .order
                .iter()
                .rev()
                .filter_map(|id| store.invoices.get(id))
                .filter(|invoice| query.matches(invoice))
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        }
    }
}
