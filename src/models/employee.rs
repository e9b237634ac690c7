use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::product::validate_price;
use super::PHONE_REGEX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "Bank Transfer")]
    #[strum(serialize = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "UPI")]
    #[strum(serialize = "UPI")]
    Upi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    /// Job title, e.g. "Store Manager".
    pub role: String,
    pub showroom_id: String,
    pub salary: Decimal,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub advance_taken: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    #[validate(length(min = 1, message = "Employee name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Role cannot be empty"))]
    pub role: String,
    #[validate(length(min = 1, message = "Showroom ID cannot be empty"))]
    pub showroom_id: String,
    #[validate(custom = "validate_price")]
    pub salary: Decimal,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub avatar: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    #[validate(custom = "validate_price")]
    pub advance_taken: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    #[validate(length(min = 1, message = "Employee name cannot be empty"))]
    pub name: Option<String>,
    pub role: Option<String>,
    #[validate(length(min = 1, message = "Showroom ID cannot be empty"))]
    pub showroom_id: Option<String>,
    #[validate(custom = "validate_price")]
    pub salary: Option<Decimal>,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    #[validate(custom = "validate_price")]
    pub advance_taken: Option<Decimal>,
}

impl EmployeeUpdate {
    pub fn apply(self, employee: &mut Employee, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            employee.name = name;
        }
        if let Some(role) = self.role {
            employee.role = role;
        }
        if let Some(showroom_id) = self.showroom_id {
            employee.showroom_id = showroom_id;
        }
        if let Some(salary) = self.salary {
            employee.salary = salary;
        }
        if let Some(phone) = self.phone {
            employee.phone = phone;
        }
        if let Some(email) = self.email {
            employee.email = email;
        }
        if self.avatar.is_some() {
            employee.avatar = self.avatar;
        }
        if let Some(method) = self.payment_method {
            employee.payment_method = method;
        }
        if let Some(advance) = self.advance_taken {
            employee.advance_taken = advance;
        }
        employee.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_keeps_display_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"Bank Transfer\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"UPI\"").unwrap(),
            PaymentMethod::Upi
        );
        assert_eq!(PaymentMethod::BankTransfer.to_string(), "Bank Transfer");
    }
}
