use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::Event,
    models::{
        generate_id, salary::net_salary, AttendanceRecord, AttendanceStatus, AttendanceUpdate,
        Employee, EmployeeUpdate, NewAttendanceRecord, NewEmployee, NewSalaryRecord,
        SalaryRecord, SalaryRecordUpdate, SalaryStatus, MONTH_REGEX,
    },
    storage::StorageKey,
    store::DataStore,
};

/// Employees plus their attendance and salary records.
#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<DataStore>,
}

impl EmployeeService {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    pub async fn list_employees(&self) -> Vec<Employee> {
        self.store.read(|s| s.employees.clone()).await
    }

    pub async fn get_employee(&self, employee_id: &str) -> Result<Employee, ServiceError> {
        self.store.read(|s| s.employee(employee_id).cloned()).await
    }

    pub async fn employees_for_showroom(&self, showroom_id: &str) -> Vec<Employee> {
        self.store
            .read(|s| {
                s.employees
                    .iter()
                    .filter(|e| e.showroom_id == showroom_id)
                    .cloned()
                    .collect()
            })
            .await
    }

    #[instrument(skip(self, new_employee), fields(name = %new_employee.name))]
    pub async fn add_employee(&self, new_employee: NewEmployee) -> Result<Employee, ServiceError> {
        new_employee.validate()?;
        let now = Utc::now();
        let employee = self
            .store
            .mutate(&[StorageKey::Employees], |s| {
                s.showroom(&new_employee.showroom_id)?;
                let employee = Employee {
                    id: generate_id(),
                    name: new_employee.name,
                    role: new_employee.role,
                    showroom_id: new_employee.showroom_id,
                    salary: new_employee.salary,
                    phone: new_employee.phone,
                    email: new_employee.email,
                    avatar: new_employee.avatar,
                    payment_method: new_employee.payment_method,
                    advance_taken: new_employee.advance_taken,
                    created_at: now,
                    updated_at: None,
                };
                s.employees.push(employee.clone());
                Ok(employee)
            })
            .await?;

        info!(employee_id = %employee.id, "Employee created");
        self.store
            .emit(Event::EmployeeCreated(employee.id.clone()))
            .await;
        Ok(employee)
    }

    #[instrument(skip(self, update))]
    pub async fn update_employee(
        &self,
        employee_id: &str,
        update: EmployeeUpdate,
    ) -> Result<Employee, ServiceError> {
        update.validate()?;
        let now = Utc::now();
        let employee = self
            .store
            .mutate(&[StorageKey::Employees], |s| {
                if let Some(showroom_id) = &update.showroom_id {
                    s.showroom(showroom_id)?;
                }
                let employee = s.employee_mut(employee_id)?;
                update.apply(employee, now);
                Ok(employee.clone())
            })
            .await?;

        self.store
            .emit(Event::EmployeeUpdated(employee_id.to_string()))
            .await;
        Ok(employee)
    }

    /// Removes the employee. Attendance and salary history is kept.
    #[instrument(skip(self))]
    pub async fn delete_employee(&self, employee_id: &str) -> Result<(), ServiceError> {
        self.store
            .mutate(&[StorageKey::Employees], |s| {
                s.employee(employee_id)?;
                s.employees.retain(|e| e.id != employee_id);
                Ok(())
            })
            .await?;

        self.store
            .emit(Event::EmployeeDeleted(employee_id.to_string()))
            .await;
        Ok(())
    }

    // Attendance

    /// Records attendance for one employee and day. A second record for the
    /// same day is a conflict; use `update_attendance` instead.
    #[instrument(skip(self, record), fields(employee_id = %record.employee_id, date = %record.date))]
    pub async fn mark_attendance(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, ServiceError> {
        record.validate()?;
        let now = Utc::now();
        let created = self
            .store
            .mutate(&[StorageKey::Attendance], |s| {
                s.employee(&record.employee_id)?;
                let duplicate = s
                    .attendance
                    .iter()
                    .any(|a| a.employee_id == record.employee_id && a.date == record.date);
                if duplicate {
                    return Err(ServiceError::Conflict(format!(
                        "Attendance for employee {} on {} already recorded",
                        record.employee_id, record.date
                    )));
                }
                let created = AttendanceRecord {
                    id: generate_id(),
                    employee_id: record.employee_id,
                    date: record.date,
                    status: record.status,
                    check_in: record.check_in,
                    check_out: record.check_out,
                    notes: record.notes,
                    created_at: now,
                };
                s.attendance.push(created.clone());
                Ok(created)
            })
            .await?;

        self.store
            .emit(Event::AttendanceMarked {
                record_id: created.id.clone(),
                employee_id: created.employee_id.clone(),
            })
            .await;
        Ok(created)
    }

    pub async fn update_attendance(
        &self,
        record_id: &str,
        update: AttendanceUpdate,
    ) -> Result<AttendanceRecord, ServiceError> {
        self.store
            .mutate(&[StorageKey::Attendance], |s| {
                let record = s
                    .attendance
                    .iter_mut()
                    .find(|a| a.id == record_id)
                    .ok_or_else(|| ServiceError::not_found("Attendance record", record_id))?;
                update.apply(record);
                Ok(record.clone())
            })
            .await
    }

    pub async fn attendance_for(&self, employee_id: &str) -> Vec<AttendanceRecord> {
        self.store
            .read(|s| {
                s.attendance
                    .iter()
                    .filter(|a| a.employee_id == employee_id)
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Days present in a `YYYY-MM` month; a half day counts as 0.5.
    pub async fn days_present(&self, employee_id: &str, month: &str) -> Result<Decimal, ServiceError> {
        if !MONTH_REGEX.is_match(month) {
            return Err(ServiceError::ValidationError(format!(
                "Month must be YYYY-MM, got {}",
                month
            )));
        }
        self.store
            .read(|s| {
                s.employee(employee_id)?;
                Ok(s.attendance
                    .iter()
                    .filter(|a| {
                        a.employee_id == employee_id && a.date.format("%Y-%m").to_string() == month
                    })
                    .map(|a| match a.status {
                        AttendanceStatus::Present => Decimal::ONE,
                        AttendanceStatus::HalfDay => Decimal::new(5, 1),
                        AttendanceStatus::Absent | AttendanceStatus::Leave => Decimal::ZERO,
                    })
                    .sum())
            })
            .await
    }

    // Salary

    /// Adds a monthly salary record with its net amount computed. One record
    /// per employee and month.
    #[instrument(skip(self, record), fields(employee_id = %record.employee_id, month = %record.month))]
    pub async fn add_salary_record(
        &self,
        record: NewSalaryRecord,
    ) -> Result<SalaryRecord, ServiceError> {
        record.validate()?;
        let now = Utc::now();
        let created = self
            .store
            .mutate(&[StorageKey::SalaryRecords], |s| {
                s.employee(&record.employee_id)?;
                let duplicate = s
                    .salary_records
                    .iter()
                    .any(|r| r.employee_id == record.employee_id && r.month == record.month);
                if duplicate {
                    return Err(ServiceError::Conflict(format!(
                        "Salary for employee {} in {} already recorded",
                        record.employee_id, record.month
                    )));
                }
                let created = SalaryRecord {
                    id: generate_id(),
                    employee_id: record.employee_id,
                    month: record.month,
                    base_salary: record.base_salary,
                    advance_taken: record.advance_taken,
                    deductions: record.deductions,
                    bonus: record.bonus,
                    net_salary: net_salary(
                        record.base_salary,
                        record.advance_taken,
                        record.deductions,
                        record.bonus,
                    ),
                    status: record.status,
                    paid_at: (record.status == SalaryStatus::Paid).then_some(now),
                    created_at: now,
                };
                s.salary_records.push(created.clone());
                Ok(created)
            })
            .await?;

        info!(record_id = %created.id, net = %created.net_salary, "Salary recorded");
        self.store
            .emit(Event::SalaryRecorded {
                record_id: created.id.clone(),
                employee_id: created.employee_id.clone(),
            })
            .await;
        Ok(created)
    }

    pub async fn update_salary_record(
        &self,
        record_id: &str,
        update: SalaryRecordUpdate,
    ) -> Result<SalaryRecord, ServiceError> {
        update.validate()?;
        let now = Utc::now();
        self.store
            .mutate(&[StorageKey::SalaryRecords], |s| {
                let record = s
                    .salary_records
                    .iter_mut()
                    .find(|r| r.id == record_id)
                    .ok_or_else(|| ServiceError::not_found("Salary record", record_id))?;
                update.apply(record, now);
                Ok(record.clone())
            })
            .await
    }

    pub async fn mark_salary_paid(&self, record_id: &str) -> Result<SalaryRecord, ServiceError> {
        self.update_salary_record(
            record_id,
            SalaryRecordUpdate {
                status: Some(SalaryStatus::Paid),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn salary_records_for(&self, employee_id: &str) -> Vec<SalaryRecord> {
        self.store
            .read(|s| {
                s.salary_records
                    .iter()
                    .filter(|r| r.employee_id == employee_id)
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Most recent month on record for the employee.
    pub async fn latest_salary_record(&self, employee_id: &str) -> Option<SalaryRecord> {
        self.store
            .read(|s| {
                s.salary_records
                    .iter()
                    .filter(|r| r.employee_id == employee_id)
                    .max_by(|a, b| {
                        a.month
                            .cmp(&b.month)
                            .then_with(|| a.created_at.cmp(&b.created_at))
                    })
                    .cloned()
            })
            .await
    }
}
