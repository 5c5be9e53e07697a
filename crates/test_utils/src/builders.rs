//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the relevant fields and take defaults for everything
//! else.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, ProductId};
use domain_inventory::Product;
use domain_invoicing::{CustomerSnapshot, InvoiceRequest, LineItemRequest, PaymentMethod};

/// Builder for [`Product`]
pub struct ProductBuilder {
    name: String,
    barcode: Option<String>,
    batch_number: Option<String>,
    expiry_date: Option<NaiveDate>,
    quantity: u32,
    minimum: u32,
    unit_price: Decimal,
    selling_price: Decimal,
    currency: Currency,
    active: bool,
}

impl Default for ProductBuilder {
    fn default() -> Self {
        Self::new("Test Tablet 10mg")
    }
}

impl ProductBuilder {
    /// 10 on hand, minimum 2, cost 60, selling price 100 INR
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            barcode: None,
            batch_number: None,
            expiry_date: None,
            quantity: 10,
            minimum: 2,
            unit_price: dec!(60),
            selling_price: dec!(100),
            currency: Currency::INR,
            active: true,
        }
    }

    pub fn barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn batch(mut self, batch_number: impl Into<String>, expiry_date: Option<NaiveDate>) -> Self {
        self.batch_number = Some(batch_number.into());
        self.expiry_date = expiry_date;
        self
    }

    pub fn expiring(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn minimum(mut self, minimum: u32) -> Self {
        self.minimum = minimum;
        self
    }

    /// Cost and selling price
    pub fn prices(mut self, unit_price: Decimal, selling_price: Decimal) -> Self {
        self.unit_price = unit_price;
        self.selling_price = selling_price;
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn build(self) -> Product {
        let mut product = Product::new(
            self.name,
            Money::new(self.unit_price, self.currency),
            Money::new(self.selling_price, self.currency),
        )
        .with_quantity(self.quantity)
        .with_minimum(self.minimum);
        product.barcode = self.barcode;
        product.batch_number = self.batch_number;
        product.expiry_date = self.expiry_date;
        product.is_active = self.active;
        product
    }
}

/// Builder for [`InvoiceRequest`]
///
/// Defaults to a credit sale to "Walk-in Customer" with no lines, so the
/// invoice stays editable unless a test opts into an immediate-settlement
/// method.
pub struct InvoiceRequestBuilder {
    request: InvoiceRequest,
}

impl Default for InvoiceRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: InvoiceRequest::new("Walk-in Customer", Vec::new())
                .with_payment(PaymentMethod::Credit, None),
        }
    }

    pub fn customer(mut self, name: impl Into<String>) -> Self {
        self.request.customer = CustomerSnapshot::named(name);
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.request.customer.phone = Some(phone.into());
        self
    }

    /// Adds a line without discount
    pub fn item(mut self, product_id: ProductId, quantity: u32, unit_price: Decimal) -> Self {
        self.request
            .items
            .push(LineItemRequest::new(product_id, quantity, unit_price));
        self
    }

    /// Adds a line with a flat discount
    pub fn discounted_item(
        mut self,
        product_id: ProductId,
        quantity: u32,
        unit_price: Decimal,
        discount: Decimal,
    ) -> Self {
        self.request
            .items
            .push(LineItemRequest::new(product_id, quantity, unit_price).with_discount(discount, None));
        self
    }

    /// Adds a line priced at the product's selling price
    pub fn product(self, product: &Product, quantity: u32) -> Self {
        let price = product.selling_price.amount();
        self.item(product.id, quantity, price)
    }

    pub fn payment(mut self, method: PaymentMethod) -> Self {
        self.request.payment_method = method;
        self
    }

    pub fn paid(mut self, amount: Decimal) -> Self {
        self.request.paid_amount = Some(amount);
        self
    }

    pub fn discount(mut self, amount: Decimal) -> Self {
        self.request.discount_amount = amount;
        self
    }

    pub fn tax(mut self, amount: Decimal, percentage: Option<Decimal>) -> Self {
        self.request.tax_amount = amount;
        self.request.tax_percentage = percentage;
        self
    }

    pub fn dated(mut self, invoice_date: NaiveDate, due_date: Option<NaiveDate>) -> Self {
        self.request.invoice_date = Some(invoice_date);
        self.request.due_date = due_date;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.request.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> InvoiceRequest {
        self.request
    }
}
