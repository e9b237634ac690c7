use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::Event,
    models::{generate_id, NewShowroom, Showroom, ShowroomUpdate, Snapshot},
    storage::StorageKey,
    store::DataStore,
};

/// Removes a showroom that nothing depends on any more.
///
/// Refused while any product holds stock there or any order, transfer
/// (whatever its status) or employee refers to it. Zero-quantity stock
/// entries for the showroom are dropped along with it.
pub fn apply_delete_showroom(
    snapshot: &mut Snapshot,
    showroom_id: &str,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    snapshot.showroom(showroom_id)?;

    let stocked: Vec<&str> = snapshot
        .products
        .iter()
        .filter(|p| p.quantity_at(showroom_id) > 0)
        .map(|p| p.name.as_str())
        .collect();
    if !stocked.is_empty() {
        return Err(ServiceError::Conflict(format!(
            "Showroom {} still holds stock of: {}",
            showroom_id,
            stocked.join(", ")
        )));
    }
    if snapshot.orders.iter().any(|o| o.showroom_id == showroom_id) {
        return Err(ServiceError::Conflict(format!(
            "Showroom {} is referenced by orders",
            showroom_id
        )));
    }
    if snapshot
        .transfers
        .iter()
        .any(|t| t.involves_showroom(showroom_id))
    {
        return Err(ServiceError::Conflict(format!(
            "Showroom {} is referenced by transfers",
            showroom_id
        )));
    }
    if snapshot.employees.iter().any(|e| e.showroom_id == showroom_id) {
        return Err(ServiceError::Conflict(format!(
            "Showroom {} still has employees assigned",
            showroom_id
        )));
    }

    for product in snapshot.products.iter_mut() {
        if product.stock.remove(showroom_id).is_some() {
            product.touch(now);
        }
    }
    snapshot.showrooms.retain(|s| s.id != showroom_id);
    Ok(())
}

#[derive(Clone)]
pub struct ShowroomService {
    store: Arc<DataStore>,
}

impl ShowroomService {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    pub async fn list_showrooms(&self) -> Vec<Showroom> {
        self.store.read(|s| s.showrooms.clone()).await
    }

    pub async fn get_showroom(&self, showroom_id: &str) -> Result<Showroom, ServiceError> {
        self.store.read(|s| s.showroom(showroom_id).cloned()).await
    }

    #[instrument(skip(self, new_showroom), fields(name = %new_showroom.name))]
    pub async fn add_showroom(&self, new_showroom: NewShowroom) -> Result<Showroom, ServiceError> {
        new_showroom.validate()?;
        let showroom = Showroom {
            id: generate_id(),
            name: new_showroom.name,
            location: new_showroom.location,
            contact_person: new_showroom.contact_person,
            phone: new_showroom.phone,
            email: new_showroom.email,
            created_at: Utc::now(),
            updated_at: None,
        };
        let created = showroom.clone();
        self.store
            .mutate(&[StorageKey::Showrooms], move |s| {
                s.showrooms.push(showroom);
                Ok(())
            })
            .await?;

        info!(showroom_id = %created.id, "Showroom created");
        self.store
            .emit(Event::ShowroomCreated(created.id.clone()))
            .await;
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub async fn update_showroom(
        &self,
        showroom_id: &str,
        update: ShowroomUpdate,
    ) -> Result<Showroom, ServiceError> {
        update.validate()?;
        let now = Utc::now();
        let showroom = self
            .store
            .mutate(&[StorageKey::Showrooms], |s| {
                let showroom = s.showroom_mut(showroom_id)?;
                update.apply(showroom, now);
                Ok(showroom.clone())
            })
            .await?;

        self.store
            .emit(Event::ShowroomUpdated(showroom_id.to_string()))
            .await;
        Ok(showroom)
    }

    #[instrument(skip(self))]
    pub async fn delete_showroom(&self, showroom_id: &str) -> Result<(), ServiceError> {
        let now = Utc::now();
        self.store
            .mutate(&[StorageKey::Showrooms, StorageKey::Products], |s| {
                apply_delete_showroom(s, showroom_id, now)
            })
            .await?;

        info!(showroom_id, "Showroom deleted");
        self.store
            .emit(Event::ShowroomDeleted(showroom_id.to_string()))
            .await;
        Ok(())
    }
}
