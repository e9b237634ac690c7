//! Transfer workflow: request, then approve or reject.
//!
//! Only approval of a `Pending` transfer touches the stock ledger. Approval
//! and rejection of a transfer that already reached a terminal state return
//! it unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::inventory::apply_move_stock;
use crate::{
    errors::ServiceError,
    events::Event,
    metrics,
    models::{generate_id, Snapshot, Transfer, TransferStatus},
    storage::StorageKey,
    store::DataStore,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[validate(length(min = 1, message = "Product ID cannot be empty"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "Source showroom cannot be empty"))]
    pub from_showroom_id: String,
    #[validate(length(min = 1, message = "Destination showroom cannot be empty"))]
    pub to_showroom_id: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
    #[validate(length(min = 1, message = "Requester cannot be empty"))]
    pub requested_by: String,
    pub notes: Option<String>,
}

pub fn apply_request_transfer(
    snapshot: &mut Snapshot,
    request: &TransferRequest,
    transfer_id: String,
    now: DateTime<Utc>,
) -> Result<Transfer, ServiceError> {
    if request.from_showroom_id == request.to_showroom_id {
        return Err(ServiceError::ValidationError(
            "Source and destination showrooms must differ".to_string(),
        ));
    }
    snapshot.showroom(&request.from_showroom_id)?;
    snapshot.showroom(&request.to_showroom_id)?;
    let product = snapshot.product(&request.product_id)?;

    let available = product.quantity_at(&request.from_showroom_id);
    if available < request.quantity {
        return Err(ServiceError::InsufficientStock {
            product_id: product.id.clone(),
            showroom_id: request.from_showroom_id.clone(),
            available,
            requested: request.quantity,
        });
    }

    let transfer = Transfer {
        id: transfer_id,
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        from_showroom_id: request.from_showroom_id.clone(),
        to_showroom_id: request.to_showroom_id.clone(),
        quantity: request.quantity,
        status: TransferStatus::Pending,
        requested_by: request.requested_by.clone(),
        approved_by: None,
        notes: request.notes.clone(),
        created_at: now,
        updated_at: None,
    };
    snapshot.transfers.push(transfer.clone());
    Ok(transfer)
}

/// Outcome of a review call.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub transfer: Transfer,
    /// False when the transfer was already terminal and nothing changed.
    pub changed: bool,
}

/// Moves the stock and marks the transfer approved. A failed move leaves the
/// transfer `Pending`.
pub fn apply_approve_transfer(
    snapshot: &mut Snapshot,
    transfer_id: &str,
    approved_by: &str,
    now: DateTime<Utc>,
) -> Result<Review, ServiceError> {
    let transfer = snapshot.transfer(transfer_id)?.clone();
    if transfer.status.is_terminal() {
        return Ok(Review {
            transfer,
            changed: false,
        });
    }

    apply_move_stock(
        snapshot,
        &transfer.product_id,
        &transfer.from_showroom_id,
        &transfer.to_showroom_id,
        transfer.quantity,
        now,
    )?;

    let transfer = snapshot.transfer_mut(transfer_id)?;
    transfer.status = TransferStatus::Approved;
    transfer.approved_by = Some(approved_by.to_string());
    transfer.updated_at = Some(now);
    Ok(Review {
        transfer: transfer.clone(),
        changed: true,
    })
}

pub fn apply_reject_transfer(
    snapshot: &mut Snapshot,
    transfer_id: &str,
    rejected_by: &str,
    now: DateTime<Utc>,
) -> Result<Review, ServiceError> {
    let transfer = snapshot.transfer_mut(transfer_id)?;
    if transfer.status.is_terminal() {
        return Ok(Review {
            transfer: transfer.clone(),
            changed: false,
        });
    }
    transfer.status = TransferStatus::Rejected;
    transfer.approved_by = Some(rejected_by.to_string());
    transfer.updated_at = Some(now);
    Ok(Review {
        transfer: transfer.clone(),
        changed: true,
    })
}

#[derive(Clone)]
pub struct TransferService {
    store: Arc<DataStore>,
}

impl TransferService {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn request_transfer(&self, request: TransferRequest) -> Result<Transfer, ServiceError> {
        request.validate()?;
        let now = Utc::now();
        let transfer_id = generate_id();
        let transfer = self
            .store
            .mutate(&[StorageKey::Transfers], |s| {
                apply_request_transfer(s, &request, transfer_id, now)
            })
            .await?;

        info!(
            transfer_id = %transfer.id,
            from = %transfer.from_showroom_id,
            to = %transfer.to_showroom_id,
            quantity = transfer.quantity,
            "Transfer requested"
        );
        self.store
            .emit(Event::TransferRequested(transfer.id.clone()))
            .await;
        Ok(transfer)
    }

    #[instrument(skip(self))]
    pub async fn approve_transfer(
        &self,
        transfer_id: &str,
        approved_by: &str,
    ) -> Result<Transfer, ServiceError> {
        let now = Utc::now();
        let result = self
            .store
            .mutate(&[StorageKey::Products, StorageKey::Transfers], |s| {
                apply_approve_transfer(s, transfer_id, approved_by, now)
            })
            .await;

        let review = match result {
            Ok(review) => review,
            Err(e @ ServiceError::InsufficientStock { .. }) => {
                metrics::TRANSFER_FAILURES.inc();
                warn!(transfer_id, error = %e, "Transfer approval failed; transfer stays pending");
                self.store
                    .emit(Event::TransferApprovalFailed {
                        transfer_id: transfer_id.to_string(),
                        reason: e.to_string(),
                    })
                    .await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if review.changed {
            metrics::TRANSFERS_APPROVED.inc();
            metrics::STOCK_MOVES.inc();
            info!(transfer_id, approved_by, "Transfer approved");
            self.store
                .emit(Event::TransferApproved {
                    transfer_id: transfer_id.to_string(),
                    approved_by: approved_by.to_string(),
                })
                .await;
        } else {
            info!(transfer_id, status = %review.transfer.status, "Transfer already reviewed");
        }
        Ok(review.transfer)
    }

    #[instrument(skip(self))]
    pub async fn reject_transfer(
        &self,
        transfer_id: &str,
        rejected_by: &str,
    ) -> Result<Transfer, ServiceError> {
        let now = Utc::now();
        let review = self
            .store
            .mutate(&[StorageKey::Transfers], |s| {
                apply_reject_transfer(s, transfer_id, rejected_by, now)
            })
            .await?;

        if review.changed {
            info!(transfer_id, rejected_by, "Transfer rejected");
            self.store
                .emit(Event::TransferRejected {
                    transfer_id: transfer_id.to_string(),
                    rejected_by: rejected_by.to_string(),
                })
                .await;
        }
        Ok(review.transfer)
    }

    pub async fn update_transfer_notes(
        &self,
        transfer_id: &str,
        notes: Option<String>,
    ) -> Result<Transfer, ServiceError> {
        let now = Utc::now();
        self.store
            .mutate(&[StorageKey::Transfers], |s| {
                let transfer = s.transfer_mut(transfer_id)?;
                transfer.notes = notes;
                transfer.updated_at = Some(now);
                Ok(transfer.clone())
            })
            .await
    }

    pub async fn list_transfers(&self) -> Vec<Transfer> {
        self.store.read(|s| s.transfers.clone()).await
    }

    pub async fn get_transfer(&self, transfer_id: &str) -> Result<Transfer, ServiceError> {
        self.store.read(|s| s.transfer(transfer_id).cloned()).await
    }

    pub async fn pending_transfers(&self) -> Vec<Transfer> {
        self.store
            .read(|s| {
                s.transfers
                    .iter()
                    .filter(|t| t.status == TransferStatus::Pending)
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Transfers where the showroom is the source or the destination.
    pub async fn transfers_for_showroom(&self, showroom_id: &str) -> Vec<Transfer> {
        self.store
            .read(|s| {
                s.transfers
                    .iter()
                    .filter(|t| t.involves_showroom(showroom_id))
                    .cloned()
                    .collect()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, ProductCategory, Showroom};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn snapshot(a: u32, b: u32) -> Snapshot {
        let now = Utc::now();
        let showroom = |id: &str| Showroom {
            id: id.into(),
            name: id.into(),
            location: "Ludhiana".into(),
            contact_person: "Gurpreet".into(),
            phone: "9876543211".into(),
            email: "g@agri.in".into(),
            created_at: now,
            updated_at: None,
        };
        Snapshot {
            showrooms: vec![showroom("A"), showroom("B")],
            products: vec![Product {
                id: "X".into(),
                name: "Hybrid Maize".into(),
                category: ProductCategory::Seeds,
                unit: "kg".into(),
                price: dec!(50),
                gst: dec!(10),
                image: None,
                description: None,
                stock: [("A".to_string(), a), ("B".to_string(), b)]
                    .into_iter()
                    .collect(),
                created_at: now,
                updated_at: None,
            }],
            ..Default::default()
        }
    }

    fn request(quantity: u32) -> TransferRequest {
        TransferRequest {
            product_id: "X".into(),
            from_showroom_id: "A".into(),
            to_showroom_id: "B".into(),
            quantity,
            requested_by: "Mumbai Admin".into(),
            notes: None,
        }
    }

    #[test]
    fn request_does_not_move_stock() {
        let mut s = snapshot(100, 20);
        let t = apply_request_transfer(&mut s, &request(30), "t1".into(), Utc::now()).unwrap();
        assert_eq!(t.status, TransferStatus::Pending);
        assert_eq!(t.product_name, "Hybrid Maize");
        assert_eq!(s.product("X").unwrap().quantity_at("A"), 100);
    }

    #[test]
    fn request_checks_source_stock() {
        let mut s = snapshot(10, 0);
        assert_matches!(
            apply_request_transfer(&mut s, &request(11), "t1".into(), Utc::now()),
            Err(ServiceError::InsufficientStock { available: 10, .. })
        );
        assert!(s.transfers.is_empty());
    }

    #[test]
    fn approval_moves_stock_once() {
        let mut s = snapshot(100, 20);
        apply_request_transfer(&mut s, &request(30), "t1".into(), Utc::now()).unwrap();

        let first = apply_approve_transfer(&mut s, "t1", "Admin", Utc::now()).unwrap();
        assert!(first.changed);
        assert_eq!(first.transfer.status, TransferStatus::Approved);
        assert_eq!(first.transfer.approved_by.as_deref(), Some("Admin"));

        let second = apply_approve_transfer(&mut s, "t1", "Admin", Utc::now()).unwrap();
        assert!(!second.changed);

        let p = s.product("X").unwrap();
        assert_eq!((p.quantity_at("A"), p.quantity_at("B")), (70, 50));
    }

    #[test]
    fn approval_without_stock_keeps_transfer_pending() {
        let mut s = snapshot(100, 20);
        apply_request_transfer(&mut s, &request(30), "t1".into(), Utc::now()).unwrap();
        s.product_mut("X").unwrap().stock.insert("A".into(), 10);
        let before = s.clone();

        assert_matches!(
            apply_approve_transfer(&mut s, "t1", "Admin", Utc::now()),
            Err(ServiceError::InsufficientStock { available: 10, requested: 30, .. })
        );
        assert_eq!(s.transfer("t1").unwrap().status, TransferStatus::Pending);
        assert_eq!(s.product("X").unwrap(), before.product("X").unwrap());
    }

    #[test]
    fn rejection_is_terminal_and_records_reviewer() {
        let mut s = snapshot(100, 20);
        apply_request_transfer(&mut s, &request(30), "t1".into(), Utc::now()).unwrap();

        let review = apply_reject_transfer(&mut s, "t1", "Super Admin", Utc::now()).unwrap();
        assert_eq!(review.transfer.status, TransferStatus::Rejected);
        assert_eq!(review.transfer.approved_by.as_deref(), Some("Super Admin"));

        let again = apply_approve_transfer(&mut s, "t1", "Admin", Utc::now()).unwrap();
        assert!(!again.changed);
        assert_eq!(again.transfer.status, TransferStatus::Rejected);
        assert_eq!(s.product("X").unwrap().quantity_at("A"), 100);
    }
}
