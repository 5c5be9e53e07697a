//! Product DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Currency, Money};
use domain_inventory::Product;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub barcode: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub minimum_quantity: u32,
    pub unit_price: Decimal,
    pub selling_price: Decimal,
}

impl CreateProductRequest {
    pub fn into_product(self, currency: Currency) -> Product {
        let mut product = Product::new(
            self.name,
            Money::new(self.unit_price, currency),
            Money::new(self.selling_price, currency),
        )
        .with_quantity(self.quantity)
        .with_minimum(self.minimum_quantity);
        product.barcode = self.barcode;
        product.batch_number = self.batch_number;
        product.expiry_date = self.expiry_date;
        product
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RestockRequest {
    #[validate(range(min = 1, message = "Restock quantity must be at least 1"))]
    pub quantity: u32,
}

/// Query string for `GET /products`
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub name: Option<String>,
    pub barcode: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
    pub expiring_within_days: Option<u32>,
    pub active: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub barcode: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub available_quantity: u32,
    pub minimum_quantity: u32,
    pub is_low_stock: bool,
    pub currency: Currency,
    pub unit_price: Decimal,
    pub selling_price: Decimal,
    pub last_restocked_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.into(),
            is_low_stock: product.is_low_stock(),
            currency: product.selling_price.currency(),
            unit_price: product.unit_price.amount(),
            selling_price: product.selling_price.amount(),
            name: product.name,
            barcode: product.barcode,
            batch_number: product.batch_number,
            expiry_date: product.expiry_date,
            available_quantity: product.available_quantity,
            minimum_quantity: product.minimum_quantity,
            last_restocked_at: product.last_restocked_at,
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}
