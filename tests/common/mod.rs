#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use agri_erp::{
    config::AppConfig,
    events::{Event, EventSender},
    models::{NewProduct, NewShowroom, ProductCategory},
    open_store,
    storage::{InMemoryStorage, StorageBackend, StorageError},
    store::DataStore,
    AppServices,
};
use async_trait::async_trait;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

/// Configuration suitable for tests: in-memory storage, no login delay.
pub fn test_config() -> AppConfig {
    AppConfig {
        storage_backend: "memory".to_string(),
        login_delay_ms: 0,
        ..AppConfig::default()
    }
}

/// Application wired over an in-memory backend the test can inspect.
pub struct TestApp {
    pub backend: Arc<FailingStorage>,
    pub store: Arc<DataStore>,
    pub services: AppServices,
    events: mpsc::Receiver<Event>,
}

impl TestApp {
    /// Store seeded with the default dataset.
    pub async fn seeded() -> Self {
        Self::build(true).await
    }

    /// Store with no data at all.
    pub async fn empty() -> Self {
        Self::build(false).await
    }

    async fn build(seed: bool) -> Self {
        let config = AppConfig {
            seed_on_start: seed,
            ..test_config()
        };
        let backend = Arc::new(FailingStorage::new());
        let (tx, rx) = mpsc::channel(1024);
        let store = Arc::new(
            open_store(&config, backend.clone())
                .await
                .expect("store opens")
                .with_events(EventSender::new(tx)),
        );
        let services = AppServices::new(store.clone(), &config);
        Self {
            backend,
            store,
            services,
            events: rx,
        }
    }

    /// Events emitted so far.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Raw JSON stored under `key` (without prefix).
    pub async fn stored_json(&self, key: &str) -> Option<serde_json::Value> {
        self.backend
            .get(&format!("ag_{}", key))
            .await
            .expect("backend readable")
            .map(|raw| serde_json::from_str(&raw).expect("stored value is JSON"))
    }
}

/// Two showrooms and one product with stock `{A: 100, B: 20}`, price 50,
/// GST 10%.
pub struct Scenario {
    pub app: TestApp,
    pub showroom_a: String,
    pub showroom_b: String,
    pub product_x: String,
}

pub async fn scenario() -> Scenario {
    let app = TestApp::empty().await;
    let showroom_a = add_showroom(&app, "Nashik Agro Point", "9876500001").await;
    let showroom_b = add_showroom(&app, "Satara Krishi Kendra", "9876500002").await;

    let mut stock = BTreeMap::new();
    stock.insert(showroom_a.clone(), 100);
    stock.insert(showroom_b.clone(), 20);
    let product = app
        .services
        .inventory
        .add_product(NewProduct {
            name: "Hybrid Tomato Seeds".to_string(),
            category: ProductCategory::Seeds,
            unit: "packet".to_string(),
            price: dec!(50),
            gst: dec!(10),
            image: None,
            description: None,
            stock,
        })
        .await
        .expect("product created");

    Scenario {
        app,
        showroom_a,
        showroom_b,
        product_x: product.id,
    }
}

pub async fn add_showroom(app: &TestApp, name: &str, phone: &str) -> String {
    app.services
        .showrooms
        .add_showroom(NewShowroom {
            name: name.to_string(),
            location: "Maharashtra".to_string(),
            contact_person: "Test Manager".to_string(),
            phone: phone.to_string(),
            email: "manager@example.com".to_string(),
        })
        .await
        .expect("showroom created")
        .id
}

/// In-memory backend whose writes to one chosen key can be made to fail.
#[derive(Default)]
pub struct FailingStorage {
    inner: InMemoryStorage,
    failing_key: Mutex<Option<String>>,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write to `key` (full key, e.g. `ag_orders`) fail.
    pub fn fail_writes_to(&self, key: &str) {
        *self.failing_key.lock().unwrap() = Some(key.to_string());
    }

    pub fn heal(&self) {
        *self.failing_key.lock().unwrap() = None;
    }
}

#[async_trait]
impl StorageBackend for FailingStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let failing = self.failing_key.lock().unwrap().clone();
        if failing.as_deref() == Some(key) {
            return Err(StorageError::OperationFailed("quota exceeded".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear().await
    }
}
