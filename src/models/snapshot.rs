use serde::{Deserialize, Serialize};

use super::{
    AttendanceRecord, AuthState, Employee, Order, Product, SalaryRecord, Settings, Showroom,
    Transfer,
};
use crate::errors::ServiceError;

/// Every collection the store holds, as one consistent value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub products: Vec<Product>,
    pub showrooms: Vec<Showroom>,
    pub orders: Vec<Order>,
    pub employees: Vec<Employee>,
    pub attendance: Vec<AttendanceRecord>,
    pub salary_records: Vec<SalaryRecord>,
    pub transfers: Vec<Transfer>,
    pub settings: Settings,
    pub auth: AuthState,
    /// Last order sequence number handed out.
    pub order_sequence: u64,
}

impl Snapshot {
    pub fn product(&self, id: &str) -> Result<&Product, ServiceError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    pub fn product_mut(&mut self, id: &str) -> Result<&mut Product, ServiceError> {
        self.products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    pub fn showroom(&self, id: &str) -> Result<&Showroom, ServiceError> {
        self.showrooms
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ServiceError::not_found("Showroom", id))
    }

    pub fn showroom_mut(&mut self, id: &str) -> Result<&mut Showroom, ServiceError> {
        self.showrooms
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ServiceError::not_found("Showroom", id))
    }

    pub fn order(&self, id: &str) -> Result<&Order, ServiceError> {
        self.orders
            .iter()
            .find(|o| o.id == id)
            .ok_or_else(|| ServiceError::not_found("Order", id))
    }

    pub fn order_mut(&mut self, id: &str) -> Result<&mut Order, ServiceError> {
        self.orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ServiceError::not_found("Order", id))
    }

    pub fn transfer(&self, id: &str) -> Result<&Transfer, ServiceError> {
        self.transfers
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| ServiceError::not_found("Transfer", id))
    }

    pub fn transfer_mut(&mut self, id: &str) -> Result<&mut Transfer, ServiceError> {
        self.transfers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ServiceError::not_found("Transfer", id))
    }

    pub fn employee(&self, id: &str) -> Result<&Employee, ServiceError> {
        self.employees
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| ServiceError::not_found("Employee", id))
    }

    pub fn employee_mut(&mut self, id: &str) -> Result<&mut Employee, ServiceError> {
        self.employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ServiceError::not_found("Employee", id))
    }
}
