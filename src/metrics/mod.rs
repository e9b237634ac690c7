/*!
 * # Metrics Module
 *
 * Prometheus counters for stock ledger, order and transfer activity and for
 * persistence writes. Everything is registered in a crate-local registry and
 * rendered in the text exposition format by [`gather_text`].
 */

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ORDERS_PLACED: IntCounter = register_counter(
        "agri_orders_placed_total",
        "Total number of orders placed"
    );
    pub static ref ORDER_FAILURES: IntCounter = register_counter(
        "agri_order_failures_total",
        "Total number of rejected order placements"
    );
    pub static ref STOCK_UPDATES: IntCounter = register_counter(
        "agri_stock_updates_total",
        "Total number of absolute or relative stock adjustments"
    );
    pub static ref STOCK_MOVES: IntCounter = register_counter(
        "agri_stock_moves_total",
        "Total number of stock moves between showrooms"
    );
    pub static ref TRANSFERS_APPROVED: IntCounter = register_counter(
        "agri_transfers_approved_total",
        "Total number of approved transfers"
    );
    pub static ref TRANSFER_FAILURES: IntCounter = register_counter(
        "agri_transfer_failures_total",
        "Total number of transfer approvals that could not move stock"
    );
    pub static ref PERSISTENCE_WRITES: IntCounterVec = register_counter_vec(
        "agri_persistence_writes_total",
        "Collection writes by outcome",
        &["outcome"]
    );
}

fn register_counter(name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("metric can be created");
    if let Err(e) = REGISTRY.register(Box::new(counter.clone())) {
        error!("Failed to register metric {}: {}", name, e);
    }
    counter
}

fn register_counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), labels).expect("metric can be created");
    if let Err(e) = REGISTRY.register(Box::new(counter.clone())) {
        error!("Failed to register metric {}: {}", name, e);
    }
    counter
}

pub fn record_persistence_write(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    PERSISTENCE_WRITES.with_label_values(&[outcome]).inc();
}

/// Renders every registered metric in Prometheus text format.
pub fn gather_text() -> String {
    // Touch lazily-initialised counters so they show up before first use.
    lazy_static::initialize(&ORDERS_PLACED);
    lazy_static::initialize(&ORDER_FAILURES);
    lazy_static::initialize(&STOCK_UPDATES);
    lazy_static::initialize(&STOCK_MOVES);
    lazy_static::initialize(&TRANSFERS_APPROVED);
    lazy_static::initialize(&TRANSFER_FAILURES);
    lazy_static::initialize(&PERSISTENCE_WRITES);

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
