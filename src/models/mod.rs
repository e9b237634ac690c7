//! Entity types persisted by the store.
//!
//! Field names serialize in camelCase so the persisted blobs keep the layout
//! the dashboard has always written (`showroomId`, `createdAt`, ...).

use lazy_static::lazy_static;
use regex::Regex;

pub mod attendance;
pub mod auth;
pub mod employee;
pub mod order;
pub mod product;
pub mod salary;
pub mod settings;
pub mod showroom;
pub mod snapshot;
pub mod transfer;

pub use attendance::{AttendanceRecord, AttendanceStatus, AttendanceUpdate, NewAttendanceRecord};
pub use auth::{AuthState, Role, User};
pub use employee::{Employee, EmployeeUpdate, NewEmployee, PaymentMethod};
pub use order::{Order, OrderItem, OrderStatus, OrderTotals, OrderUpdate};
pub use product::{NewProduct, Product, ProductCategory, ProductUpdate, StockLevels};
pub use salary::{NewSalaryRecord, SalaryRecord, SalaryRecordUpdate, SalaryStatus};
pub use settings::{NotificationSettings, Settings, SettingsUpdate};
pub use showroom::{NewShowroom, Showroom, ShowroomUpdate};
pub use snapshot::Snapshot;
pub use transfer::{Transfer, TransferStatus};

lazy_static! {
    /// Optional `+<country code>` followed by a 10 digit number.
    pub static ref PHONE_REGEX: Regex =
        Regex::new(r"^(\+\d{1,3}[\s-]?)?\d{10}$").expect("phone regex compiles");
    /// `YYYY-MM`
    pub static ref MONTH_REGEX: Regex =
        Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("month regex compiles");
}

/// Fresh entity id.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
