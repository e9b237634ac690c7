use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Domain events emitted after a mutation has been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    ProductCreated(String),
    ProductUpdated(String),
    ProductDeleted(String),
    ShowroomCreated(String),
    ShowroomUpdated(String),
    ShowroomDeleted(String),

    // Stock ledger events
    StockUpdated {
        product_id: String,
        showroom_id: String,
        old_quantity: u32,
        new_quantity: u32,
        reason: Option<String>,
    },
    StockMoved {
        product_id: String,
        from_showroom_id: String,
        to_showroom_id: String,
        quantity: u32,
    },

    // Order events
    OrderPlaced {
        order_id: String,
        order_number: String,
        showroom_id: String,
    },
    OrderUpdated(String),
    OrderStatusChanged {
        order_id: String,
        old_status: String,
        new_status: String,
    },
    OrderDeleted(String),

    // Transfer events
    TransferRequested(String),
    TransferApproved {
        transfer_id: String,
        approved_by: String,
    },
    TransferRejected {
        transfer_id: String,
        rejected_by: String,
    },
    TransferApprovalFailed {
        transfer_id: String,
        reason: String,
    },

    // People events
    EmployeeCreated(String),
    EmployeeUpdated(String),
    EmployeeDeleted(String),
    AttendanceMarked {
        record_id: String,
        employee_id: String,
    },
    SalaryRecorded {
        record_id: String,
        employee_id: String,
    },

    SettingsUpdated,

    // Session events
    LoggedIn {
        user_id: String,
        at: DateTime<Utc>,
    },
    LoggedOut,
}

/// Drains the event channel, logging each event.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::TransferApprovalFailed {
                transfer_id,
                reason,
            } => {
                warn!(transfer_id = %transfer_id, reason = %reason, "Transfer approval failed");
            }
            Event::StockMoved {
                product_id,
                from_showroom_id,
                to_showroom_id,
                quantity,
            } => {
                info!(
                    product_id = %product_id,
                    from = %from_showroom_id,
                    to = %to_showroom_id,
                    quantity = quantity,
                    "Stock moved"
                );
            }
            other => info!("Received event: {:?}", other),
        }
    }

    info!("Event channel closed; stopping event processing loop");
}
