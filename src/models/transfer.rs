use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transfer review state. `Approved` and `Rejected` are terminal.
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
)]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub from_showroom_id: String,
    pub to_showroom_id: String,
    pub quantity: u32,
    pub status: TransferStatus,
    pub requested_by: String,
    /// Reviewer of the request, recorded on approval and on rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transfer {
    pub fn involves_showroom(&self, showroom_id: &str) -> bool {
        self.from_showroom_id == showroom_id || self.to_showroom_id == showroom_id
    }
}
