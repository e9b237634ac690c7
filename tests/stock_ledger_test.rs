mod common;

use agri_erp::{errors::ServiceError, events::Event, services::inventory::AdjustmentKind};
use assert_matches::assert_matches;
use common::{scenario, TestApp};

#[tokio::test]
async fn move_stock_conserves_total() {
    let s = scenario().await;
    let inventory = &s.app.services.inventory;

    inventory
        .move_stock(&s.product_x, &s.showroom_a, &s.showroom_b, 30)
        .await
        .unwrap();

    let product = inventory.get_product(&s.product_x).await.unwrap();
    assert_eq!(product.quantity_at(&s.showroom_a), 70);
    assert_eq!(product.quantity_at(&s.showroom_b), 50);
    assert_eq!(product.total_stock(), 120);
}

#[tokio::test]
async fn insufficient_move_is_reported_and_not_persisted() {
    let s = scenario().await;
    let before = s.app.stored_json("products").await;

    let err = s
        .app
        .services
        .inventory
        .move_stock(&s.product_x, &s.showroom_b, &s.showroom_a, 21)
        .await
        .unwrap_err();

    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            available: 20,
            requested: 21,
            ..
        }
    );
    assert_eq!(s.app.stored_json("products").await, before);
    assert_eq!(
        s.app
            .services
            .inventory
            .stock_level(&s.product_x, &s.showroom_b)
            .await
            .unwrap(),
        20
    );
}

#[tokio::test]
async fn set_stock_overrides_quantity_and_emits_event() {
    let mut s = scenario().await;
    s.app.drain_events();

    let change = s
        .app
        .services
        .inventory
        .set_stock(&s.product_x, &s.showroom_a, 5)
        .await
        .unwrap();
    assert_eq!(change.old_quantity, 100);
    assert_eq!(change.new_quantity, 5);

    let events = s.app.drain_events();
    assert_matches!(
        events.as_slice(),
        [Event::StockUpdated { old_quantity: 100, new_quantity: 5, .. }]
    );
}

#[tokio::test]
async fn set_stock_requires_known_showroom() {
    let s = scenario().await;
    let err = s
        .app
        .services
        .inventory
        .set_stock(&s.product_x, "nowhere", 5)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn adjust_stock_adds_and_refuses_negative_result() {
    let s = scenario().await;
    let inventory = &s.app.services.inventory;

    let added = inventory
        .adjust_stock(
            &s.product_x,
            &s.showroom_b,
            AdjustmentKind::Add,
            15,
            Some("Received from supplier".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(added.new_quantity, 35);

    let err = inventory
        .adjust_stock(&s.product_x, &s.showroom_b, AdjustmentKind::Subtract, 36, None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock { available: 35, .. });
}

#[tokio::test]
async fn product_with_pending_transfer_cannot_be_deleted() {
    let app = TestApp::seeded().await;
    app.services
        .transfers
        .request_transfer(agri_erp::services::transfers::TransferRequest {
            product_id: "2".to_string(),
            from_showroom_id: "1".to_string(),
            to_showroom_id: "3".to_string(),
            quantity: 10,
            requested_by: "Mumbai Store Manager".to_string(),
            notes: None,
        })
        .await
        .unwrap();

    let err = app.services.inventory.delete_product("2").await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    app.services.inventory.delete_product("3").await.unwrap();
    assert_matches!(
        app.services.inventory.get_product("3").await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn product_update_leaves_stock_untouched() {
    let app = TestApp::seeded().await;
    let updated = app
        .services
        .inventory
        .update_product(
            "1",
            agri_erp::models::ProductUpdate {
                price: Some(rust_decimal_macros::dec!(130)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, rust_decimal_macros::dec!(130));
    assert_eq!(updated.quantity_at("2"), 750);
    assert!(updated.updated_at.is_some());
}
