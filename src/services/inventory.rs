use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::Event,
    metrics,
    models::{generate_id, NewProduct, Product, ProductUpdate, Snapshot, TransferStatus},
    storage::StorageKey,
    store::DataStore,
};

/// Direction of a relative stock adjustment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Add,
    Subtract,
}

/// Result of a single-showroom stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    pub old_quantity: u32,
    pub new_quantity: u32,
}

/// Overwrites the quantity of `product_id` at `showroom_id`.
pub fn apply_set_stock(
    snapshot: &mut Snapshot,
    product_id: &str,
    showroom_id: &str,
    quantity: u32,
    now: DateTime<Utc>,
) -> Result<StockChange, ServiceError> {
    snapshot.showroom(showroom_id)?;
    let product = snapshot.product_mut(product_id)?;
    let old_quantity = product.quantity_at(showroom_id);
    product.stock.insert(showroom_id.to_string(), quantity);
    product.touch(now);
    Ok(StockChange {
        old_quantity,
        new_quantity: quantity,
    })
}

/// Moves `quantity` units between two showrooms of one product.
///
/// Either both sides change or neither does; total stock of the product is
/// conserved.
pub fn apply_move_stock(
    snapshot: &mut Snapshot,
    product_id: &str,
    from_showroom_id: &str,
    to_showroom_id: &str,
    quantity: u32,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if quantity == 0 {
        return Err(ServiceError::ValidationError(
            "Transfer quantity must be greater than zero".to_string(),
        ));
    }
    if from_showroom_id == to_showroom_id {
        return Err(ServiceError::ValidationError(
            "Source and destination showrooms must differ".to_string(),
        ));
    }
    snapshot.showroom(from_showroom_id)?;
    snapshot.showroom(to_showroom_id)?;

    let product = snapshot.product_mut(product_id)?;
    let available = product.quantity_at(from_showroom_id);
    if available < quantity {
        return Err(ServiceError::InsufficientStock {
            product_id: product_id.to_string(),
            showroom_id: from_showroom_id.to_string(),
            available,
            requested: quantity,
        });
    }
    let destination = product
        .quantity_at(to_showroom_id)
        .checked_add(quantity)
        .ok_or_else(|| {
            ServiceError::InvalidOperation(format!(
                "Stock of product {} at showroom {} would overflow",
                product_id, to_showroom_id
            ))
        })?;

    product
        .stock
        .insert(from_showroom_id.to_string(), available - quantity);
    product.stock.insert(to_showroom_id.to_string(), destination);
    product.touch(now);
    Ok(())
}

/// Adds to or subtracts from the quantity at one showroom. Subtraction never
/// drives stock below zero.
pub fn apply_adjust_stock(
    snapshot: &mut Snapshot,
    product_id: &str,
    showroom_id: &str,
    kind: AdjustmentKind,
    quantity: u32,
    now: DateTime<Utc>,
) -> Result<StockChange, ServiceError> {
    if quantity == 0 {
        return Err(ServiceError::ValidationError(
            "Adjustment quantity must be greater than zero".to_string(),
        ));
    }
    snapshot.showroom(showroom_id)?;
    let product = snapshot.product_mut(product_id)?;
    let old_quantity = product.quantity_at(showroom_id);
    let new_quantity = match kind {
        AdjustmentKind::Add => old_quantity.checked_add(quantity).ok_or_else(|| {
            ServiceError::InvalidOperation(format!(
                "Stock of product {} at showroom {} would overflow",
                product_id, showroom_id
            ))
        })?,
        AdjustmentKind::Subtract => {
            old_quantity
                .checked_sub(quantity)
                .ok_or_else(|| ServiceError::InsufficientStock {
                    product_id: product_id.to_string(),
                    showroom_id: showroom_id.to_string(),
                    available: old_quantity,
                    requested: quantity,
                })?
        }
    };
    product.stock.insert(showroom_id.to_string(), new_quantity);
    product.touch(now);
    Ok(StockChange {
        old_quantity,
        new_quantity,
    })
}

/// Stock ledger and product catalog operations.
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<DataStore>,
}

impl InventoryService {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    pub async fn list_products(&self) -> Vec<Product> {
        self.store.read(|s| s.products.clone()).await
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product, ServiceError> {
        self.store
            .read(|s| s.product(product_id).cloned())
            .await
    }

    /// Quantity of a product at one showroom; zero when never stocked there.
    pub async fn stock_level(&self, product_id: &str, showroom_id: &str) -> Result<u32, ServiceError> {
        self.store
            .read(|s| s.product(product_id).map(|p| p.quantity_at(showroom_id)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn set_stock(
        &self,
        product_id: &str,
        showroom_id: &str,
        quantity: u32,
    ) -> Result<StockChange, ServiceError> {
        let now = Utc::now();
        let change = self
            .store
            .mutate(&[StorageKey::Products], |s| {
                apply_set_stock(s, product_id, showroom_id, quantity, now)
            })
            .await?;

        metrics::STOCK_UPDATES.inc();
        info!(
            product_id,
            showroom_id,
            old_quantity = change.old_quantity,
            new_quantity = change.new_quantity,
            "Stock level set"
        );
        self.store
            .emit(Event::StockUpdated {
                product_id: product_id.to_string(),
                showroom_id: showroom_id.to_string(),
                old_quantity: change.old_quantity,
                new_quantity: change.new_quantity,
                reason: None,
            })
            .await;
        Ok(change)
    }

    #[instrument(skip(self))]
    pub async fn move_stock(
        &self,
        product_id: &str,
        from_showroom_id: &str,
        to_showroom_id: &str,
        quantity: u32,
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        self.store
            .mutate(&[StorageKey::Products], |s| {
                apply_move_stock(s, product_id, from_showroom_id, to_showroom_id, quantity, now)
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "Stock move rejected");
                e
            })?;

        metrics::STOCK_MOVES.inc();
        self.store
            .emit(Event::StockMoved {
                product_id: product_id.to_string(),
                from_showroom_id: from_showroom_id.to_string(),
                to_showroom_id: to_showroom_id.to_string(),
                quantity,
            })
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        showroom_id: &str,
        kind: AdjustmentKind,
        quantity: u32,
        reason: Option<String>,
    ) -> Result<StockChange, ServiceError> {
        let now = Utc::now();
        let change = self
            .store
            .mutate(&[StorageKey::Products], |s| {
                apply_adjust_stock(s, product_id, showroom_id, kind, quantity, now)
            })
            .await?;

        metrics::STOCK_UPDATES.inc();
        info!(
            product_id,
            showroom_id,
            %kind,
            quantity,
            "Stock adjusted"
        );
        self.store
            .emit(Event::StockUpdated {
                product_id: product_id.to_string(),
                showroom_id: showroom_id.to_string(),
                old_quantity: change.old_quantity,
                new_quantity: change.new_quantity,
                reason,
            })
            .await;
        Ok(change)
    }

    #[instrument(skip(self, new_product), fields(name = %new_product.name))]
    pub async fn add_product(&self, new_product: NewProduct) -> Result<Product, ServiceError> {
        new_product.validate()?;
        let now = Utc::now();
        let product = self
            .store
            .mutate(&[StorageKey::Products], |s| {
                for showroom_id in new_product.stock.keys() {
                    s.showroom(showroom_id).map_err(|_| {
                        ServiceError::ValidationError(format!(
                            "Stock references unknown showroom {}",
                            showroom_id
                        ))
                    })?;
                }
                let product = Product {
                    id: generate_id(),
                    name: new_product.name,
                    category: new_product.category,
                    unit: new_product.unit,
                    price: new_product.price,
                    gst: new_product.gst,
                    image: new_product.image,
                    description: new_product.description,
                    stock: new_product.stock,
                    created_at: now,
                    updated_at: None,
                };
                s.products.push(product.clone());
                Ok(product)
            })
            .await?;

        info!(product_id = %product.id, "Product created");
        self.store.emit(Event::ProductCreated(product.id.clone())).await;
        Ok(product)
    }

    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        product_id: &str,
        update: ProductUpdate,
    ) -> Result<Product, ServiceError> {
        update.validate()?;
        let now = Utc::now();
        let product = self
            .store
            .mutate(&[StorageKey::Products], |s| {
                let product = s.product_mut(product_id)?;
                update.apply(product, now);
                Ok(product.clone())
            })
            .await?;

        self.store
            .emit(Event::ProductUpdated(product_id.to_string()))
            .await;
        Ok(product)
    }

    /// Removes a product. Refused while a pending transfer still references it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: &str) -> Result<(), ServiceError> {
        self.store
            .mutate(&[StorageKey::Products], |s| {
                s.product(product_id)?;
                let pending = s.transfers.iter().any(|t| {
                    t.product_id == product_id && t.status == TransferStatus::Pending
                });
                if pending {
                    return Err(ServiceError::Conflict(format!(
                        "Product {} has pending transfers",
                        product_id
                    )));
                }
                s.products.retain(|p| p.id != product_id);
                Ok(())
            })
            .await?;

        info!(product_id, "Product deleted");
        self.store
            .emit(Event::ProductDeleted(product_id.to_string()))
            .await;
        Ok(())
    }
}
