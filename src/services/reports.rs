//! Derived views over a [`Snapshot`].
//!
//! The free functions here are pure projections; [`ReportService`] only
//! takes a consistent snapshot from the store and hands it to them.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    errors::ServiceError,
    models::{
        order::round_money, Order, OrderStatus, Product, ProductCategory, SalaryStatus, Snapshot,
        TransferStatus,
    },
    store::DataStore,
};

/// Total stock below which a product is reported as low on stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 50;

/// Window on order `created_at`; both ends are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ServiceError> {
        if start > end {
            return Err(ServiceError::ValidationError(format!(
                "Report range starts ({}) after it ends ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days in UTC, from the first instant of `first` to the
    /// last millisecond of `last`.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Result<Self, ServiceError> {
        let start = first
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ServiceError::ValidationError(format!("Invalid date {}", first)))?;
        let end = last
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| ServiceError::ValidationError(format!("Invalid date {}", last)))?;
        Self::new(start.and_utc(), end.and_utc())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Rolling report window ending now.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl ReportPeriod {
    pub fn range_ending(self, now: DateTime<Utc>) -> DateRange {
        let start = match self {
            ReportPeriod::Week => now.checked_sub_signed(Duration::days(7)),
            ReportPeriod::Month => now.checked_sub_months(Months::new(1)),
            ReportPeriod::Quarter => now.checked_sub_months(Months::new(3)),
            ReportPeriod::Year => now.checked_sub_months(Months::new(12)),
        };
        DateRange {
            start: start.unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: now,
        }
    }
}

/// Orders created inside `range`, or every order when there is none.
fn orders_in(snapshot: &Snapshot, range: Option<DateRange>) -> impl Iterator<Item = &Order> {
    snapshot
        .orders
        .iter()
        .filter(move |o| range.map_or(true, |r| r.contains(o.created_at)))
}

/// A product together with the quantity held at one showroom.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAvailability {
    #[serde(flatten)]
    pub product: Product,
    pub available_stock: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowroomSales {
    pub showroom_id: String,
    pub showroom_name: String,
    pub order_count: usize,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySales {
    pub category: ProductCategory,
    pub quantity: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub order_count: usize,
    pub revenue: Decimal,
    pub gst_collected: Decimal,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    pub month: String,
    pub record_count: usize,
    pub total_net: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub product_count: usize,
    pub showroom_count: usize,
    pub employee_count: usize,
    pub order_count: usize,
    pub pending_orders: usize,
    pub pending_transfers: usize,
    pub low_stock_count: usize,
    pub stock_value: Decimal,
    pub revenue: Decimal,
    pub products_per_category: BTreeMap<String, usize>,
}

/// Value of stock on hand at `price`. With no showroom, stock across every
/// showroom is counted.
pub fn stock_value(snapshot: &Snapshot, showroom_id: Option<&str>) -> Decimal {
    snapshot
        .products
        .iter()
        .map(|p| {
            let quantity = match showroom_id {
                Some(id) => u64::from(p.quantity_at(id)),
                None => p.total_stock(),
            };
            Decimal::from(quantity) * p.price
        })
        .sum()
}

pub fn products_available_at(snapshot: &Snapshot, showroom_id: &str) -> Vec<ProductAvailability> {
    snapshot
        .products
        .iter()
        .map(|p| ProductAvailability {
            available_stock: p.quantity_at(showroom_id),
            product: p.clone(),
        })
        .collect()
}

/// Products whose stock summed over all showrooms is below `threshold`.
pub fn low_stock_products(snapshot: &Snapshot, threshold: u64) -> Vec<Product> {
    snapshot
        .products
        .iter()
        .filter(|p| p.total_stock() < threshold)
        .cloned()
        .collect()
}

pub fn out_of_stock_products(snapshot: &Snapshot) -> Vec<Product> {
    snapshot
        .products
        .iter()
        .filter(|p| p.total_stock() == 0)
        .cloned()
        .collect()
}

/// Order count and revenue (order totals including GST) per showroom.
pub fn sales_by_showroom(snapshot: &Snapshot, range: Option<DateRange>) -> Vec<ShowroomSales> {
    snapshot
        .showrooms
        .iter()
        .map(|showroom| {
            let orders = orders_in(snapshot, range).filter(|o| o.showroom_id == showroom.id);
            let (order_count, revenue) = orders.fold((0, Decimal::ZERO), |(count, sum), o| {
                (count + 1, sum + o.total)
            });
            ShowroomSales {
                showroom_id: showroom.id.clone(),
                showroom_name: showroom.name.clone(),
                order_count,
                revenue,
            }
        })
        .collect()
}

/// Units sold and revenue before GST per category. Lines whose product no
/// longer exists are skipped.
pub fn sales_by_category(snapshot: &Snapshot, range: Option<DateRange>) -> Vec<CategorySales> {
    let mut by_category: BTreeMap<String, CategorySales> = BTreeMap::new();
    for item in orders_in(snapshot, range).flat_map(|o| o.items.iter()) {
        let Ok(product) = snapshot.product(&item.product_id) else {
            continue;
        };
        let entry = by_category
            .entry(product.category.to_string())
            .or_insert(CategorySales {
                category: product.category,
                quantity: 0,
                revenue: Decimal::ZERO,
            });
        entry.quantity += u64::from(item.quantity);
        entry.revenue += item.amount();
    }
    by_category.into_values().collect()
}

/// Best sellers by units, ties broken by name.
pub fn top_products(
    snapshot: &Snapshot,
    limit: usize,
    range: Option<DateRange>,
) -> Vec<TopProduct> {
    let mut by_product: BTreeMap<&str, TopProduct> = BTreeMap::new();
    for item in orders_in(snapshot, range).flat_map(|o| o.items.iter()) {
        let entry = by_product
            .entry(item.product_id.as_str())
            .or_insert_with(|| TopProduct {
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
        entry.quantity += u64::from(item.quantity);
        entry.revenue += item.amount();
    }

    let mut ranked: Vec<TopProduct> = by_product.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(limit);
    ranked
}

pub fn sales_summary(snapshot: &Snapshot, range: Option<DateRange>) -> SalesSummary {
    let (order_count, revenue, gst_collected) = orders_in(snapshot, range).fold(
        (0, Decimal::ZERO, Decimal::ZERO),
        |(count, revenue, gst), o| (count + 1, revenue + o.total, gst + o.total_gst),
    );
    let average_order_value = if order_count == 0 {
        Decimal::ZERO
    } else {
        round_money(revenue / Decimal::from(order_count))
    };
    SalesSummary {
        order_count,
        revenue,
        gst_collected,
        average_order_value,
    }
}

/// Salary totals for a `YYYY-MM` month, optionally limited to the employees
/// of one showroom.
pub fn monthly_payroll(snapshot: &Snapshot, month: &str, showroom_id: Option<&str>) -> PayrollSummary {
    let in_scope = |employee_id: &str| match showroom_id {
        None => true,
        Some(id) => snapshot
            .employees
            .iter()
            .any(|e| e.id == employee_id && e.showroom_id == id),
    };

    let mut summary = PayrollSummary {
        month: month.to_string(),
        record_count: 0,
        total_net: Decimal::ZERO,
        paid: Decimal::ZERO,
        pending: Decimal::ZERO,
    };
    for record in snapshot
        .salary_records
        .iter()
        .filter(|r| r.month == month && in_scope(&r.employee_id))
    {
        summary.record_count += 1;
        summary.total_net += record.net_salary;
        match record.status {
            SalaryStatus::Paid => summary.paid += record.net_salary,
            SalaryStatus::Pending => summary.pending += record.net_salary,
        }
    }
    summary
}

pub fn dashboard_summary(snapshot: &Snapshot, low_stock_threshold: u64) -> DashboardSummary {
    let mut products_per_category = BTreeMap::new();
    for product in &snapshot.products {
        *products_per_category
            .entry(product.category.to_string())
            .or_insert(0) += 1;
    }

    DashboardSummary {
        product_count: snapshot.products.len(),
        showroom_count: snapshot.showrooms.len(),
        employee_count: snapshot.employees.len(),
        order_count: snapshot.orders.len(),
        pending_orders: snapshot
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        pending_transfers: snapshot
            .transfers
            .iter()
            .filter(|t| t.status == TransferStatus::Pending)
            .count(),
        low_stock_count: low_stock_products(snapshot, low_stock_threshold).len(),
        stock_value: stock_value(snapshot, None),
        revenue: snapshot.orders.iter().map(|o| o.total).sum(),
        products_per_category,
    }
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<DataStore>,
    low_stock_threshold: u64,
}

impl ReportService {
    pub fn new(store: Arc<DataStore>, low_stock_threshold: u64) -> Self {
        Self {
            store,
            low_stock_threshold,
        }
    }

    pub fn low_stock_threshold(&self) -> u64 {
        self.low_stock_threshold
    }

    pub async fn stock_value(&self, showroom_id: Option<&str>) -> Decimal {
        self.store.read(|s| stock_value(s, showroom_id)).await
    }

    pub async fn products_available_at(&self, showroom_id: &str) -> Vec<ProductAvailability> {
        self.store
            .read(|s| products_available_at(s, showroom_id))
            .await
    }

    pub async fn low_stock_products(&self) -> Vec<Product> {
        let threshold = self.low_stock_threshold;
        self.store.read(|s| low_stock_products(s, threshold)).await
    }

    pub async fn out_of_stock_products(&self) -> Vec<Product> {
        self.store.read(out_of_stock_products).await
    }

    pub async fn sales_by_showroom(&self, range: Option<DateRange>) -> Vec<ShowroomSales> {
        self.store.read(|s| sales_by_showroom(s, range)).await
    }

    pub async fn sales_by_category(&self, range: Option<DateRange>) -> Vec<CategorySales> {
        self.store.read(|s| sales_by_category(s, range)).await
    }

    pub async fn top_products(&self, limit: usize, range: Option<DateRange>) -> Vec<TopProduct> {
        self.store.read(|s| top_products(s, limit, range)).await
    }

    pub async fn sales_summary(&self, range: Option<DateRange>) -> SalesSummary {
        self.store.read(|s| sales_summary(s, range)).await
    }

    pub async fn monthly_payroll(&self, month: &str, showroom_id: Option<&str>) -> PayrollSummary {
        self.store
            .read(|s| monthly_payroll(s, month, showroom_id))
            .await
    }

    pub async fn dashboard_summary(&self) -> DashboardSummary {
        let threshold = self.low_stock_threshold;
        self.store.read(|s| dashboard_summary(s, threshold)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::seed::{default_products, default_showrooms};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn seeded() -> Snapshot {
        let now = Utc::now();
        Snapshot {
            showrooms: default_showrooms(now),
            products: default_products(now),
            ..Default::default()
        }
    }

    #[test]
    fn stock_value_per_showroom_and_overall() {
        let s = seeded();
        // 500*120 + 1000*35 + 200*280 + 5*25000
        assert_eq!(stock_value(&s, Some("1")), dec!(276000));
        let total: Decimal = ["1", "2", "3"]
            .iter()
            .map(|id| stock_value(&s, Some(id)))
            .sum();
        assert_eq!(stock_value(&s, None), total);
        assert_eq!(stock_value(&s, Some("missing")), Decimal::ZERO);
    }

    #[test]
    fn low_stock_uses_global_total() {
        let s = seeded();
        // Tractor Plow: 5 + 3 + 2 = 10
        let low = low_stock_products(&s, DEFAULT_LOW_STOCK_THRESHOLD);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "4");
        assert!(low_stock_products(&s, 10).is_empty());
    }

    #[test]
    fn availability_defaults_to_zero() {
        let mut s = seeded();
        s.products[0].stock.remove("3");
        let rows = products_available_at(&s, "3");
        assert_eq!(rows[0].available_stock, 0);
        assert_eq!(rows[1].available_stock, 600);
    }

    #[test]
    fn empty_snapshot_has_zero_average_order_value() {
        let summary = sales_summary(&Snapshot::default(), None);
        assert_eq!(summary.order_count, 0);
        assert_eq!(summary.average_order_value, Decimal::ZERO);
    }

    fn order_at(id: &str, showroom_id: &str, created_at: DateTime<Utc>) -> Order {
        let items = vec![crate::models::OrderItem {
            product_id: "1".into(),
            product_name: "Premium Wheat Seeds".into(),
            quantity: 2,
            unit: "kg".into(),
            price: dec!(120),
            gst: dec!(5),
        }];
        let totals = crate::models::OrderTotals::from_items(&items);
        Order {
            id: id.into(),
            order_number: format!("AG250301{}", id),
            customer_name: "Ramesh Patil".into(),
            customer_phone: "9876543210".into(),
            customer_address: String::new(),
            items,
            subtotal: totals.subtotal,
            total_gst: totals.total_gst,
            total: totals.total,
            status: OrderStatus::Pending,
            showroom_id: showroom_id.into(),
            created_at,
            updated_at: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn date_range_includes_both_ends() {
        let range = DateRange::from_dates(day(1), day(31)).unwrap();
        let first = day(1).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let last = day(31).and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc();

        assert!(range.contains(first));
        assert!(range.contains(last));
        assert!(!range.contains(first - Duration::milliseconds(1)));
        assert!(!range.contains(last + Duration::milliseconds(1)));
        assert!(DateRange::from_dates(day(2), day(1)).is_err());
    }

    #[test]
    fn sales_views_only_count_orders_in_range() {
        let mut s = seeded();
        let range = DateRange::from_dates(day(10), day(20)).unwrap();
        s.orders = vec![
            order_at("1", "1", range.start),
            order_at("2", "2", range.end),
            order_at("3", "1", range.start - Duration::seconds(1)),
            order_at("4", "2", range.end + Duration::seconds(1)),
        ];

        let summary = sales_summary(&s, Some(range));
        assert_eq!(summary.order_count, 2);
        // 2 * 120 = 240 plus 5% GST
        assert_eq!(summary.revenue, dec!(504));
        assert_eq!(summary.gst_collected, dec!(24));
        assert_eq!(sales_summary(&s, None).order_count, 4);

        let by_showroom = sales_by_showroom(&s, Some(range));
        assert!(by_showroom
            .iter()
            .filter(|row| row.showroom_id != "3")
            .all(|row| row.order_count == 1));

        let categories = sales_by_category(&s, Some(range));
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].quantity, 4);

        let top = top_products(&s, 5, Some(range));
        assert_eq!(top[0].quantity, 4);
        assert_eq!(top_products(&s, 5, None)[0].quantity, 8);
    }

    #[test]
    fn report_periods_end_now() {
        let now = day(31).and_hms_opt(12, 0, 0).unwrap().and_utc();
        assert_eq!(
            ReportPeriod::Week.range_ending(now).start,
            day(24).and_hms_opt(12, 0, 0).unwrap().and_utc()
        );
        // 31 February clamps to the last day of the month
        assert_eq!(
            ReportPeriod::Month.range_ending(now).start,
            NaiveDate::from_ymd_opt(2025, 2, 28)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_utc()
        );
        assert_eq!(
            ReportPeriod::Year.range_ending(now).start,
            NaiveDate::from_ymd_opt(2024, 3, 31)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_utc()
        );
        for period in <ReportPeriod as strum::IntoEnumIterator>::iter() {
            let range = period.range_ending(now);
            assert_eq!(range.end, now);
            assert!(range.contains(now));
        }
        assert_eq!(ReportPeriod::default(), ReportPeriod::Month);
        assert_eq!("quarter".parse::<ReportPeriod>().unwrap(), ReportPeriod::Quarter);
    }

    #[test]
    fn dashboard_counts_categories() {
        let d = dashboard_summary(&seeded(), DEFAULT_LOW_STOCK_THRESHOLD);
        assert_eq!(d.product_count, 4);
        assert_eq!(d.showroom_count, 3);
        assert_eq!(d.low_stock_count, 1);
        assert_eq!(d.products_per_category.get("Seeds"), Some(&1));
    }
}
