use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::Event,
    models::{Settings, SettingsUpdate},
    storage::StorageKey,
    store::DataStore,
};

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<DataStore>,
}

impl SettingsService {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    pub async fn settings(&self) -> Settings {
        self.store.read(|s| s.settings.clone()).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings, ServiceError> {
        update.validate()?;
        let settings = self
            .store
            .mutate(&[StorageKey::Settings], |s| {
                update.apply(&mut s.settings);
                Ok(s.settings.clone())
            })
            .await?;

        self.store.emit(Event::SettingsUpdated).await;
        Ok(settings)
    }
}
