use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

/// Quantity on hand keyed by showroom id. A missing showroom means zero.
pub type StockLevels = BTreeMap<String, u32>;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum ProductCategory {
    Seeds,
    Fertilizer,
    Pesticide,
    Equipment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: ProductCategory,
    pub unit: String,
    pub price: Decimal,
    /// GST rate in percent.
    pub gst: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub stock: StockLevels,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn quantity_at(&self, showroom_id: &str) -> u32 {
        self.stock.get(showroom_id).copied().unwrap_or(0)
    }

    /// Stock summed across every showroom.
    pub fn total_stock(&self) -> u64 {
        self.stock.values().map(|&qty| u64::from(qty)).sum()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: String,
    pub category: ProductCategory,
    #[validate(length(min = 1, message = "Unit cannot be empty"))]
    pub unit: String,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[validate(custom = "validate_gst_rate")]
    pub gst: Decimal,
    pub image: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub stock: StockLevels,
}

/// Field-wise merge for an existing product. Stock is changed through the
/// inventory service only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
    #[validate(length(min = 1, message = "Unit cannot be empty"))]
    pub unit: Option<String>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_gst_rate")]
    pub gst: Option<Decimal>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl ProductUpdate {
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(unit) = self.unit {
            product.unit = unit;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(gst) = self.gst {
            product.gst = gst;
        }
        if self.image.is_some() {
            product.image = self.image;
        }
        if self.description.is_some() {
            product.description = self.description;
        }
        product.touch(now);
    }
}

pub(crate) fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("negative_price"));
    }
    Ok(())
}

pub(crate) fn validate_gst_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() || *rate > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("gst_rate_out_of_range"));
    }
    Ok(())
}
