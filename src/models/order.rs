use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::PHONE_REGEX;

/// Order lifecycle. Orders only move forward:
/// `Pending -> Approved -> Delivered`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum OrderStatus {
    Pending,
    Approved,
    Delivered,
}

impl OrderStatus {
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Approved)
                | (OrderStatus::Approved, OrderStatus::Delivered)
        )
    }

    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Approved),
            OrderStatus::Approved => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }
}

/// One product line, with name, unit, price and GST rate captured when the
/// order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit: String,
    pub price: Decimal,
    pub gst: Decimal,
}

impl OrderItem {
    pub fn amount(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }

    /// Unrounded GST for the line; rounding happens once on the order sum.
    pub fn gst_amount(&self) -> Decimal {
        self.amount() * self.gst / Decimal::ONE_HUNDRED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub total_gst: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    pub fn from_items(items: &[OrderItem]) -> Self {
        let subtotal = round_money(items.iter().map(OrderItem::amount).sum());
        let total_gst = round_money(items.iter().map(OrderItem::gst_amount).sum());
        Self {
            subtotal,
            total_gst,
            total: subtotal + total_gst,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub total_gst: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub showroom_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            total_gst: self.total_gst,
            total: self.total,
        }
    }
}

/// Customer-facing fields that may be corrected after placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer_name: Option<String>,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
}

impl OrderUpdate {
    pub fn apply(self, order: &mut Order, now: DateTime<Utc>) {
        if let Some(name) = self.customer_name {
            order.customer_name = name;
        }
        if let Some(phone) = self.customer_phone {
            order.customer_phone = phone;
        }
        if let Some(address) = self.customer_address {
            order.customer_address = address;
        }
        order.updated_at = Some(now);
    }
}

/// Rounds to the currency's minor unit (paise).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `AG` + `YYMMDD` + sequence zero-padded to four digits.
pub fn format_order_number(date: NaiveDate, sequence: u64) -> String {
    format!(
        "AG{:02}{:02}{:02}{:04}",
        date.year().rem_euclid(100),
        date.month(),
        date.day(),
        sequence
    )
}
