use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::store::DataStore;

pub mod auth;
pub mod employees;
pub mod inventory;
pub mod orders;
pub mod reports;
pub mod settings;
pub mod showrooms;
pub mod transfers;

/// Every service, sharing one [`DataStore`].
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<inventory::InventoryService>,
    pub orders: Arc<orders::OrderService>,
    pub transfers: Arc<transfers::TransferService>,
    pub showrooms: Arc<showrooms::ShowroomService>,
    pub employees: Arc<employees::EmployeeService>,
    pub settings: Arc<settings::SettingsService>,
    pub reports: Arc<reports::ReportService>,
    pub auth: Arc<auth::AuthService>,
}

impl AppServices {
    pub fn new(store: Arc<DataStore>, config: &AppConfig) -> Self {
        Self {
            inventory: Arc::new(inventory::InventoryService::new(store.clone())),
            orders: Arc::new(orders::OrderService::new(store.clone())),
            transfers: Arc::new(transfers::TransferService::new(store.clone())),
            showrooms: Arc::new(showrooms::ShowroomService::new(store.clone())),
            employees: Arc::new(employees::EmployeeService::new(store.clone())),
            settings: Arc::new(settings::SettingsService::new(store.clone())),
            reports: Arc::new(reports::ReportService::new(
                store.clone(),
                config.low_stock_threshold,
            )),
            auth: Arc::new(auth::AuthService::new(
                store,
                Duration::from_millis(config.login_delay_ms),
            )),
        }
    }
}
