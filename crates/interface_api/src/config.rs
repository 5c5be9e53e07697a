//! API configuration

use serde::Deserialize;

use core_kernel::Currency;
use domain_invoicing::{numbering, InvoiceNumbering, LifecyclePolicy};

/// API configuration
///
/// Every field can be set through an `API_`-prefixed environment variable,
/// e.g. `API_PORT=9000` or `API_PARTIAL_PAYMENTS=true`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL URL; in-memory storage when absent
    pub database_url: Option<String>,
    /// Log level
    pub log_level: String,
    /// Currency of every price and invoice
    pub currency: Currency,
    /// Invoice number prefix
    pub invoice_prefix: String,
    /// Zero-padded width of the invoice sequence
    pub invoice_width: usize,
    /// Map `0 < paid < total` to `partial` instead of `pending`
    pub partial_payments: bool,
    /// Allow editing a cancelled invoice, re-reserving its items
    pub reactivate_cancelled_on_edit: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let policy = LifecyclePolicy::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            log_level: "info".to_string(),
            currency: policy.currency,
            invoice_prefix: numbering::DEFAULT_PREFIX.to_string(),
            invoice_width: numbering::DEFAULT_WIDTH,
            partial_payments: policy.partial_payments,
            reactivate_cancelled_on_edit: policy.reactivate_cancelled_on_edit,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            currency: self.currency,
            partial_payments: self.partial_payments,
            reactivate_cancelled_on_edit: self.reactivate_cancelled_on_edit,
        }
    }

    pub fn numbering(&self) -> InvoiceNumbering {
        InvoiceNumbering::new(self.invoice_prefix.clone(), self.invoice_width)
    }
}
