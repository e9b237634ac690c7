mod common;

use std::{sync::Arc, time::Duration};

use agri_erp::{
    config::AppConfig,
    errors::ServiceError,
    events::{process_events, EventSender},
    open_backend, open_store,
    services::orders::{OrderLineRequest, PlaceOrderRequest},
    storage::{seed::seed_defaults, FileStorage, InMemoryStorage, Repository, StorageKey},
    AppServices,
};
use assert_matches::assert_matches;
use common::{test_config, TestApp};
use tempfile::TempDir;
use tokio::sync::mpsc;

fn file_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        storage_backend: "file".to_string(),
        storage_dir: dir.path().to_path_buf(),
        ..test_config()
    }
}

fn small_order() -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer_name: "Harpreet Kaur".to_string(),
        customer_phone: "9812345678".to_string(),
        customer_address: "Moga, Punjab".to_string(),
        showroom_id: "2".to_string(),
        items: vec![OrderLineRequest {
            product_id: "1".to_string(),
            quantity: 50,
        }],
    }
}

#[tokio::test]
async fn file_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);

    let before = {
        let backend = open_backend(&config).await.unwrap();
        let store = Arc::new(open_store(&config, backend).await.unwrap());
        let services = AppServices::new(store.clone(), &config);
        services.orders.place_order(small_order()).await.unwrap();
        services.auth.login("admin@agrierp.com", "admin123").await.unwrap();
        store.snapshot().await
    };

    let backend = open_backend(&config).await.unwrap();
    let reopened = open_store(&config, backend).await.unwrap();
    let after = reopened.snapshot().await;

    assert_eq!(after, before);
    assert_eq!(after.orders.len(), 1);
    assert_eq!(after.order_sequence, 1);
    assert_eq!(after.products[0].quantity_at("2"), 700);
    assert!(after.auth.is_authenticated);
    assert!(dir.path().join("ag_orders.json").exists());
}

#[tokio::test]
async fn failed_write_rolls_back_every_collection() {
    let app = TestApp::seeded().await;
    let products_before = app.stored_json("products").await;
    let snapshot_before = app.store.snapshot().await;

    app.backend.fail_writes_to("ag_orders");
    let err = app
        .services
        .orders
        .place_order(small_order())
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::StorageError(_));
    assert!(!err.is_client_error());
    assert_eq!(app.stored_json("products").await, products_before);
    assert_eq!(app.stored_json("orders").await, None);
    assert_eq!(app.store.snapshot().await, snapshot_before);

    app.backend.heal();
    let order = app.services.orders.place_order(small_order()).await.unwrap();
    assert!(order.order_number.ends_with("0001"));
}

#[tokio::test]
async fn corrupted_collection_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        seed_on_start: false,
        ..file_config(&dir)
    };
    std::fs::write(dir.path().join("ag_products.json"), "{ not json").unwrap();
    std::fs::write(dir.path().join("ag_settings.json"), "[1, 2").unwrap();

    let backend = open_backend(&config).await.unwrap();
    let store = open_store(&config, backend).await.unwrap();
    let snapshot = store.snapshot().await;

    assert!(snapshot.products.is_empty());
    assert_eq!(snapshot.settings, agri_erp::models::Settings::default());
}

#[tokio::test]
async fn seeding_twice_keeps_existing_data() {
    let backend = Arc::new(InMemoryStorage::new());
    let repo = Repository::new(backend.clone(), "ag_");

    let first = seed_defaults(&repo).await.unwrap();
    assert!(first.contains(&StorageKey::Products));
    assert!(!first.contains(&StorageKey::Orders));

    repo.save(StorageKey::Showrooms, &Vec::<agri_erp::models::Showroom>::new())
        .await
        .unwrap();
    let second = seed_defaults(&repo).await.unwrap();
    assert!(second.is_empty());

    let showrooms: Vec<agri_erp::models::Showroom> =
        repo.load(StorageKey::Showrooms, Vec::new()).await;
    assert!(showrooms.is_empty());
}

#[tokio::test]
async fn key_prefix_namespaces_the_files() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).await.unwrap());
    let config = AppConfig {
        key_prefix: "branch_".to_string(),
        ..file_config(&dir)
    };

    open_store(&config, storage).await.unwrap();

    assert!(dir.path().join("branch_products.json").exists());
    assert!(!dir.path().join("ag_products.json").exists());
}

#[tokio::test]
async fn event_loop_stops_after_services_are_dropped() {
    let config = test_config();
    let (tx, rx) = mpsc::channel(64);
    let events = tokio::spawn(process_events(rx));

    let store = open_store(&config, Arc::new(InMemoryStorage::new()))
        .await
        .unwrap()
        .with_events(EventSender::new(tx));
    let services = AppServices::new(Arc::new(store), &config);
    services.orders.place_order(small_order()).await.unwrap();

    drop(services);
    tokio::time::timeout(Duration::from_secs(5), events)
        .await
        .expect("event loop should stop once every sender is gone")
        .unwrap();
}
