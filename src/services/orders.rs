use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::Event,
    metrics,
    models::{
        generate_id, order::format_order_number, Order, OrderItem, OrderStatus, OrderTotals,
        OrderUpdate, Snapshot, PHONE_REGEX,
    },
    storage::StorageKey,
    store::DataStore,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    #[validate(length(min = 1, message = "Product ID cannot be empty"))]
    pub product_id: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
}

/// Cart submitted for placement. Prices, GST rates, names and units are
/// resolved from the live catalog at placement time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer_name: String,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: String,
    #[validate(length(min = 1, message = "Showroom ID cannot be empty"))]
    pub showroom_id: String,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderLineRequest>,
}

impl PlaceOrderRequest {
    fn validate_all(&self) -> Result<(), ServiceError> {
        self.validate()?;
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }
}

/// Builds the order, decrements stock at the order's showroom and advances
/// the order sequence. Stock for every product is checked before anything is
/// decremented.
pub fn apply_place_order(
    snapshot: &mut Snapshot,
    request: &PlaceOrderRequest,
    order_id: String,
    now: DateTime<Utc>,
) -> Result<Order, ServiceError> {
    let showroom_id = request.showroom_id.as_str();
    snapshot.showroom(showroom_id)?;

    let mut requested: BTreeMap<&str, u32> = BTreeMap::new();
    for line in &request.items {
        let total = requested.entry(line.product_id.as_str()).or_insert(0);
        *total = total.checked_add(line.quantity).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Quantity for product {} is too large",
                line.product_id
            ))
        })?;
    }

    for (&product_id, &quantity) in &requested {
        let available = snapshot.product(product_id)?.quantity_at(showroom_id);
        if available < quantity {
            return Err(ServiceError::InsufficientStock {
                product_id: product_id.to_string(),
                showroom_id: showroom_id.to_string(),
                available,
                requested: quantity,
            });
        }
    }

    let items = request
        .items
        .iter()
        .map(|line| {
            let product = snapshot.product(&line.product_id)?;
            Ok(OrderItem {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit: product.unit.clone(),
                price: product.price,
                gst: product.gst,
            })
        })
        .collect::<Result<Vec<_>, ServiceError>>()?;

    for (&product_id, &quantity) in &requested {
        let product = snapshot.product_mut(product_id)?;
        let remaining = product.quantity_at(showroom_id) - quantity;
        product.stock.insert(showroom_id.to_string(), remaining);
        product.touch(now);
    }

    snapshot.order_sequence += 1;
    let totals = OrderTotals::from_items(&items);
    let order = Order {
        id: order_id,
        order_number: format_order_number(now.date_naive(), snapshot.order_sequence),
        customer_name: request.customer_name.clone(),
        customer_phone: request.customer_phone.clone(),
        customer_address: request.customer_address.clone(),
        items,
        subtotal: totals.subtotal,
        total_gst: totals.total_gst,
        total: totals.total,
        status: OrderStatus::Pending,
        showroom_id: showroom_id.to_string(),
        created_at: now,
        updated_at: None,
    };
    snapshot.orders.push(order.clone());
    Ok(order)
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<DataStore>,
}

impl OrderService {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    /// Places an order and decrements stock at its showroom in one commit.
    #[instrument(skip(self, request), fields(showroom_id = %request.showroom_id))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, ServiceError> {
        request.validate_all()?;
        let now = Utc::now();
        let order_id = generate_id();

        let result = self
            .store
            .mutate(
                &[
                    StorageKey::Products,
                    StorageKey::Orders,
                    StorageKey::OrderSequence,
                ],
                |s| apply_place_order(s, &request, order_id, now),
            )
            .await;

        let order = match result {
            Ok(order) => order,
            Err(e) => {
                metrics::ORDER_FAILURES.inc();
                warn!(error = %e, "Order placement rejected");
                return Err(e);
            }
        };

        metrics::ORDERS_PLACED.inc();
        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );
        self.store
            .emit(Event::OrderPlaced {
                order_id: order.id.clone(),
                order_number: order.order_number.clone(),
                showroom_id: order.showroom_id.clone(),
            })
            .await;
        Ok(order)
    }

    pub async fn list_orders(&self) -> Vec<Order> {
        self.store.read(|s| s.orders.clone()).await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, ServiceError> {
        self.store.read(|s| s.order(order_id).cloned()).await
    }

    pub async fn find_order_by_number(&self, order_number: &str) -> Result<Order, ServiceError> {
        self.store
            .read(|s| {
                s.orders
                    .iter()
                    .find(|o| o.order_number == order_number)
                    .cloned()
                    .ok_or_else(|| ServiceError::not_found("Order", order_number))
            })
            .await
    }

    pub async fn orders_for_showroom(&self, showroom_id: &str) -> Vec<Order> {
        self.store
            .read(|s| {
                s.orders
                    .iter()
                    .filter(|o| o.showroom_id == showroom_id)
                    .cloned()
                    .collect()
            })
            .await
    }

    #[instrument(skip(self, update))]
    pub async fn update_order(
        &self,
        order_id: &str,
        update: OrderUpdate,
    ) -> Result<Order, ServiceError> {
        update.validate()?;
        let now = Utc::now();
        let order = self
            .store
            .mutate(&[StorageKey::Orders], |s| {
                let order = s.order_mut(order_id)?;
                update.apply(order, now);
                Ok(order.clone())
            })
            .await?;

        self.store.emit(Event::OrderUpdated(order.id.clone())).await;
        Ok(order)
    }

    /// Moves an order one step along `Pending -> Approved -> Delivered`.
    #[instrument(skip(self))]
    pub async fn advance_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        let now = Utc::now();
        let (order, old_status) = self
            .store
            .mutate(&[StorageKey::Orders], |s| {
                let order = s.order_mut(order_id)?;
                let old_status = order.status;
                if !old_status.can_advance_to(status) {
                    return Err(ServiceError::InvalidTransition {
                        entity: "order",
                        from: old_status.to_string(),
                        to: status.to_string(),
                    });
                }
                order.status = status;
                order.updated_at = Some(now);
                Ok((order.clone(), old_status))
            })
            .await?;

        info!(order_id, from = %old_status, to = %status, "Order status changed");
        self.store
            .emit(Event::OrderStatusChanged {
                order_id: order.id.clone(),
                old_status: old_status.to_string(),
                new_status: status.to_string(),
            })
            .await;
        Ok(order)
    }

    /// Removes an order. Stock is not returned to the showroom.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: &str) -> Result<(), ServiceError> {
        self.store
            .mutate(&[StorageKey::Orders], |s| {
                s.order(order_id)?;
                s.orders.retain(|o| o.id != order_id);
                Ok(())
            })
            .await?;

        self.store.emit(Event::OrderDeleted(order_id.to_string())).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, ProductCategory, Showroom};
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn snapshot() -> Snapshot {
        let now = Utc::now();
        let showroom = Showroom {
            id: "A".into(),
            name: "Central".into(),
            location: "Mumbai".into(),
            contact_person: "Rajesh".into(),
            phone: "9876543210".into(),
            email: "rajesh@agri.in".into(),
            created_at: now,
            updated_at: None,
        };
        let product = |id: &str, price: Decimal, qty: u32| Product {
            id: id.into(),
            name: format!("Product {}", id),
            category: ProductCategory::Seeds,
            unit: "kg".into(),
            price,
            gst: dec!(10),
            image: None,
            description: None,
            stock: [("A".to_string(), qty)].into_iter().collect(),
            created_at: now,
            updated_at: None,
        };
        Snapshot {
            showrooms: vec![showroom],
            products: vec![product("X", dec!(50), 100), product("Y", dec!(20), 5)],
            ..Default::default()
        }
    }

    fn request(items: &[(&str, u32)]) -> PlaceOrderRequest {
        PlaceOrderRequest {
            customer_name: "Ravi Patil".into(),
            customer_phone: "+91 9123456780".into(),
            customer_address: "Village Road, Satara".into(),
            showroom_id: "A".into(),
            items: items
                .iter()
                .map(|(id, qty)| OrderLineRequest {
                    product_id: id.to_string(),
                    quantity: *qty,
                })
                .collect(),
        }
    }

    #[test]
    fn placement_snapshots_prices_and_decrements_stock() {
        let mut s = snapshot();
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 10, 0, 0).unwrap();
        let order = apply_place_order(&mut s, &request(&[("X", 10)]), "o1".into(), now).unwrap();

        assert_eq!(order.order_number, "AG2503070001");
        assert_eq!(order.total, dec!(550));
        assert_eq!(order.items[0].price, dec!(50));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(s.product("X").unwrap().quantity_at("A"), 90);
        assert_eq!(s.order_sequence, 1);
        assert_eq!(s.orders.len(), 1);
    }

    #[test]
    fn oversold_line_aborts_whole_order() {
        let mut s = snapshot();
        let before = s.clone();
        let err = apply_place_order(&mut s, &request(&[("X", 10), ("Y", 6)]), "o1".into(), Utc::now())
            .unwrap_err();
        assert_matches!(
            err,
            ServiceError::InsufficientStock { available: 5, requested: 6, .. }
        );
        assert_eq!(s, before);
    }

    #[test]
    fn repeated_product_lines_are_checked_together() {
        let mut s = snapshot();
        let err = apply_place_order(&mut s, &request(&[("Y", 3), ("Y", 3)]), "o1".into(), Utc::now())
            .unwrap_err();
        assert_matches!(err, ServiceError::InsufficientStock { requested: 6, .. });
    }

    #[test]
    fn sequence_keeps_growing_after_deletion() {
        let mut s = snapshot();
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 10, 0, 0).unwrap();
        apply_place_order(&mut s, &request(&[("X", 1)]), "o1".into(), now).unwrap();
        s.orders.clear();
        let second = apply_place_order(&mut s, &request(&[("X", 1)]), "o2".into(), now).unwrap();
        assert_eq!(second.order_number, "AG2503070002");
    }

    #[test]
    fn request_validation_catches_bad_input() {
        let mut empty = request(&[]);
        assert!(empty.validate_all().is_err());
        empty.items = request(&[("X", 0)]).items;
        assert!(empty.validate_all().is_err());
        let mut bad_phone = request(&[("X", 1)]);
        bad_phone.customer_phone = "call me".into();
        assert!(bad_phone.validate_all().is_err());
    }
}
