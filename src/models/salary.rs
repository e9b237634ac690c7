use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::product::validate_price;
use super::MONTH_REGEX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum SalaryStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRecord {
    pub id: String,
    pub employee_id: String,
    /// `YYYY-MM`
    pub month: String,
    pub base_salary: Decimal,
    pub advance_taken: Decimal,
    pub deductions: Decimal,
    pub bonus: Decimal,
    pub net_salary: Decimal,
    pub status: SalaryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SalaryRecord {
    pub fn recompute_net(&mut self) {
        self.net_salary =
            net_salary(self.base_salary, self.advance_taken, self.deductions, self.bonus);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSalaryRecord {
    #[validate(length(min = 1, message = "Employee ID cannot be empty"))]
    pub employee_id: String,
    #[validate(regex(path = "MONTH_REGEX", message = "Month must be YYYY-MM"))]
    pub month: String,
    #[validate(custom = "validate_price")]
    pub base_salary: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_price")]
    pub advance_taken: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_price")]
    pub deductions: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_price")]
    pub bonus: Decimal,
    pub status: SalaryStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRecordUpdate {
    #[validate(custom = "validate_price")]
    pub base_salary: Option<Decimal>,
    #[validate(custom = "validate_price")]
    pub advance_taken: Option<Decimal>,
    #[validate(custom = "validate_price")]
    pub deductions: Option<Decimal>,
    #[validate(custom = "validate_price")]
    pub bonus: Option<Decimal>,
    pub status: Option<SalaryStatus>,
}

impl SalaryRecordUpdate {
    pub fn apply(self, record: &mut SalaryRecord, now: DateTime<Utc>) {
        if let Some(base) = self.base_salary {
            record.base_salary = base;
        }
        if let Some(advance) = self.advance_taken {
            record.advance_taken = advance;
        }
        if let Some(deductions) = self.deductions {
            record.deductions = deductions;
        }
        if let Some(bonus) = self.bonus {
            record.bonus = bonus;
        }
        if let Some(status) = self.status {
            if status == SalaryStatus::Paid && record.status != SalaryStatus::Paid {
                record.paid_at = Some(now);
            }
            if status == SalaryStatus::Pending {
                record.paid_at = None;
            }
            record.status = status;
        }
        record.recompute_net();
    }
}

/// `base - advance - deductions + bonus`
pub fn net_salary(base: Decimal, advance: Decimal, deductions: Decimal, bonus: Decimal) -> Decimal {
    base - advance - deductions + bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn net_salary_subtracts_advance_and_deductions() {
        assert_eq!(
            net_salary(dec!(35000), dec!(5000), dec!(1200), dec!(2000)),
            dec!(30800)
        );
    }

    #[test]
    fn month_must_be_year_and_month() {
        let mut record = NewSalaryRecord {
            employee_id: "1".into(),
            month: "2025-13".into(),
            base_salary: dec!(1000),
            advance_taken: Decimal::ZERO,
            deductions: Decimal::ZERO,
            bonus: Decimal::ZERO,
            status: SalaryStatus::Pending,
        };
        assert!(record.validate().is_err());
        record.month = "2025-12".into();
        assert!(record.validate().is_ok());
    }
}
