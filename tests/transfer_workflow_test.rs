mod common;

use agri_erp::{
    errors::ServiceError,
    events::Event,
    models::TransferStatus,
    services::transfers::TransferRequest,
};
use assert_matches::assert_matches;
use common::{scenario, Scenario};

fn request(s: &Scenario, quantity: u32) -> TransferRequest {
    TransferRequest {
        product_id: s.product_x.clone(),
        from_showroom_id: s.showroom_a.clone(),
        to_showroom_id: s.showroom_b.clone(),
        quantity,
        requested_by: "Nashik Manager".to_string(),
        notes: Some("Kharif season demand".to_string()),
    }
}

#[tokio::test]
async fn request_does_not_move_stock() {
    let mut s = scenario().await;
    s.app.drain_events();

    let transfer = s
        .app
        .services
        .transfers
        .request_transfer(request(&s, 30))
        .await
        .unwrap();

    assert_eq!(transfer.status, TransferStatus::Pending);
    assert_eq!(transfer.product_name, "Hybrid Tomato Seeds");
    assert!(transfer.approved_by.is_none());
    assert_eq!(
        s.app
            .services
            .inventory
            .stock_level(&s.product_x, &s.showroom_a)
            .await
            .unwrap(),
        100
    );
    assert_eq!(
        s.app.drain_events(),
        vec![Event::TransferRequested(transfer.id.clone())]
    );
}

#[tokio::test]
async fn request_validates_route_and_quantity() {
    let s = scenario().await;
    let transfers = &s.app.services.transfers;

    let mut same_route = request(&s, 10);
    same_route.to_showroom_id = s.showroom_a.clone();
    assert_matches!(
        transfers.request_transfer(same_route).await,
        Err(ServiceError::ValidationError(_))
    );

    assert_matches!(
        transfers.request_transfer(request(&s, 0)).await,
        Err(ServiceError::ValidationError(_))
    );

    assert_matches!(
        transfers.request_transfer(request(&s, 101)).await,
        Err(ServiceError::InsufficientStock { available: 100, .. })
    );
    assert!(transfers.list_transfers().await.is_empty());
}

#[tokio::test]
async fn approving_twice_moves_stock_once() {
    let s = scenario().await;
    let transfers = &s.app.services.transfers;
    let transfer = transfers.request_transfer(request(&s, 30)).await.unwrap();

    let first = transfers
        .approve_transfer(&transfer.id, "Super Admin")
        .await
        .unwrap();
    let second = transfers
        .approve_transfer(&transfer.id, "Someone Else")
        .await
        .unwrap();

    assert_eq!(first.status, TransferStatus::Approved);
    assert_eq!(second, first);
    assert_eq!(second.approved_by.as_deref(), Some("Super Admin"));

    let product = s
        .app
        .services
        .inventory
        .get_product(&s.product_x)
        .await
        .unwrap();
    assert_eq!(product.quantity_at(&s.showroom_a), 70);
    assert_eq!(product.quantity_at(&s.showroom_b), 50);
}

#[tokio::test]
async fn approval_fails_when_stock_was_sold_meanwhile() {
    let mut s = scenario().await;
    let services = &s.app.services;
    let transfer = services.transfers.request_transfer(request(&s, 80)).await.unwrap();

    services
        .inventory
        .set_stock(&s.product_x, &s.showroom_a, 50)
        .await
        .unwrap();
    s.app.drain_events();

    let err = s
        .app
        .services
        .transfers
        .approve_transfer(&transfer.id, "Super Admin")
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            available: 50,
            requested: 80,
            ..
        }
    );

    let stored = s
        .app
        .services
        .transfers
        .get_transfer(&transfer.id)
        .await
        .unwrap();
    assert_eq!(stored.status, TransferStatus::Pending);
    assert_eq!(
        s.app
            .services
            .inventory
            .stock_level(&s.product_x, &s.showroom_b)
            .await
            .unwrap(),
        20
    );
    assert_matches!(
        s.app.drain_events().as_slice(),
        [Event::TransferApprovalFailed { .. }]
    );

    // Restocking lets the same transfer go through.
    s.app
        .services
        .inventory
        .set_stock(&s.product_x, &s.showroom_a, 90)
        .await
        .unwrap();
    let approved = s
        .app
        .services
        .transfers
        .approve_transfer(&transfer.id, "Super Admin")
        .await
        .unwrap();
    assert_eq!(approved.status, TransferStatus::Approved);
    assert_eq!(
        s.app
            .services
            .inventory
            .stock_level(&s.product_x, &s.showroom_a)
            .await
            .unwrap(),
        10
    );
}

#[tokio::test]
async fn rejected_transfer_is_final() {
    let s = scenario().await;
    let transfers = &s.app.services.transfers;
    let transfer = transfers.request_transfer(request(&s, 30)).await.unwrap();

    let rejected = transfers
        .reject_transfer(&transfer.id, "Super Admin")
        .await
        .unwrap();
    assert_eq!(rejected.status, TransferStatus::Rejected);
    assert_eq!(rejected.approved_by.as_deref(), Some("Super Admin"));

    let after = transfers
        .approve_transfer(&transfer.id, "Super Admin")
        .await
        .unwrap();
    assert_eq!(after.status, TransferStatus::Rejected);
    assert_eq!(
        s.app
            .services
            .inventory
            .stock_level(&s.product_x, &s.showroom_a)
            .await
            .unwrap(),
        100
    );
    assert!(transfers.pending_transfers().await.is_empty());
}

#[tokio::test]
async fn unknown_transfer_is_not_found() {
    let s = scenario().await;
    assert_matches!(
        s.app
            .services
            .transfers
            .approve_transfer("missing", "Super Admin")
            .await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        s.app
            .services
            .transfers
            .reject_transfer("missing", "Super Admin")
            .await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn showroom_view_covers_both_directions() {
    let s = scenario().await;
    let transfers = &s.app.services.transfers;
    transfers.request_transfer(request(&s, 5)).await.unwrap();

    let mut back = request(&s, 5);
    back.from_showroom_id = s.showroom_b.clone();
    back.to_showroom_id = s.showroom_a.clone();
    transfers.request_transfer(back).await.unwrap();

    assert_eq!(transfers.transfers_for_showroom(&s.showroom_a).await.len(), 2);
    assert_eq!(transfers.transfers_for_showroom(&s.showroom_b).await.len(), 2);
    assert!(transfers.transfers_for_showroom("elsewhere").await.is_empty());
    assert_eq!(transfers.pending_transfers().await.len(), 2);
}
