use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::PHONE_REGEX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Showroom {
    pub id: String,
    pub name: String,
    pub location: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewShowroom {
    #[validate(length(min = 1, message = "Showroom name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Location cannot be empty"))]
    pub location: String,
    #[validate(length(min = 1, message = "Contact person cannot be empty"))]
    pub contact_person: String,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShowroomUpdate {
    #[validate(length(min = 1, message = "Showroom name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Location cannot be empty"))]
    pub location: Option<String>,
    #[validate(length(min = 1, message = "Contact person cannot be empty"))]
    pub contact_person: Option<String>,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

impl ShowroomUpdate {
    pub fn apply(self, showroom: &mut Showroom, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            showroom.name = name;
        }
        if let Some(location) = self.location {
            showroom.location = location;
        }
        if let Some(contact_person) = self.contact_person {
            showroom.contact_person = contact_person;
        }
        if let Some(phone) = self.phone {
            showroom.phone = phone;
        }
        if let Some(email) = self.email {
            showroom.email = email;
        }
        showroom.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_showroom(phone: &str, email: &str) -> NewShowroom {
        NewShowroom {
            name: "Nashik Agro Point".into(),
            location: "Nashik, Maharashtra".into(),
            contact_person: "Sunil Pawar".into(),
            phone: phone.into(),
            email: email.into(),
        }
    }

    #[test]
    fn accepts_indian_phone_formats() {
        assert!(new_showroom("+91 9876543210", "sunil@agro.in").validate().is_ok());
        assert!(new_showroom("9876543210", "sunil@agro.in").validate().is_ok());
    }

    #[test]
    fn rejects_bad_contact_fields() {
        let errors = new_showroom("12ab", "not-an-email").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("email"));
    }
}
