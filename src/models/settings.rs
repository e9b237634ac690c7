use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::product::validate_gst_rate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub email: bool,
    pub sms: bool,
    pub whatsapp: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            sms: true,
            whatsapp: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub app_title: String,
    pub company_name: String,
    pub gst_number: String,
    pub address: String,
    /// Percent applied to new products when none is given.
    pub default_gst: Decimal,
    pub currency: String,
    pub theme: String,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_title: "AgriERP Pro".to_string(),
            company_name: "Green Fields Agriculture".to_string(),
            gst_number: "22AAAAA0000A1Z5".to_string(),
            address: "123 Agriculture Hub, Farm City, State - 123456".to_string(),
            default_gst: dec!(12),
            currency: "INR".to_string(),
            theme: "light".to_string(),
            notifications: NotificationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[validate(length(min = 1, message = "App title cannot be empty"))]
    pub app_title: Option<String>,
    #[validate(length(min = 1, message = "Company name cannot be empty"))]
    pub company_name: Option<String>,
    #[validate(length(equal = 15, message = "GSTIN must be 15 characters"))]
    pub gst_number: Option<String>,
    pub address: Option<String>,
    #[validate(custom = "validate_gst_rate")]
    pub default_gst: Option<Decimal>,
    #[validate(length(equal = 3, message = "Currency must be an ISO 4217 code"))]
    pub currency: Option<String>,
    pub theme: Option<String>,
    pub notifications: Option<NotificationSettings>,
}

impl SettingsUpdate {
    pub fn apply(self, settings: &mut Settings) {
        if let Some(title) = self.app_title {
            settings.app_title = title;
        }
        if let Some(company) = self.company_name {
            settings.company_name = company;
        }
        if let Some(gst_number) = self.gst_number {
            settings.gst_number = gst_number;
        }
        if let Some(address) = self.address {
            settings.address = address;
        }
        if let Some(default_gst) = self.default_gst {
            settings.default_gst = default_gst;
        }
        if let Some(currency) = self.currency {
            settings.currency = currency;
        }
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(notifications) = self.notifications {
            settings.notifications = notifications;
        }
    }
}
