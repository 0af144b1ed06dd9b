//! Daily attendance report.
//!
//! For every employee in the (possibly narrowed) directory the report joins
//! the shift assignment and the attendance record of the requested day and
//! classifies the result. Missing data never fails the report, it shows up
//! as `Unassigned`/`Absent` and `"N/A"` fields instead.

mod reconcile;
pub mod source;

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

pub use reconcile::{AttendanceStatus, Reconciliation, reconcile};
use source::{AssignedShift, DirectoryEntry, ReportSource};

use crate::model::attendance::AttendanceRecord;

pub const NOT_AVAILABLE: &str = "N/A";

/// Cost centers allowed to see every department; their requests are never narrowed.
static PRIVILEGED_COST_CENTERS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["C003", "CC_RH_01"].into_iter().collect());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "user_id": 1,
    "employee_number": "EMP-001",
    "full_name": "Ana Torres",
    "department": "Ventas",
    "role": "Employee",
    "cost_center": "CC_X",
    "date": "2025-07-31",
    "scheduled_check_in": "09:00:00",
    "actual_check_in": "09:10:00",
    "check_out": "N/A",
    "status": "Late",
    "delay_minutes": 10
}))]
pub struct ReportRow {
    pub user_id: u64,
    pub employee_number: String,
    pub full_name: String,
    pub department: String,
    pub role: String,
    pub cost_center: String,
    pub date: String,
    pub scheduled_check_in: String,
    pub actual_check_in: String,
    pub check_out: String,
    pub status: AttendanceStatus,
    pub delay_minutes: i64,
}

impl ReportRow {
    fn new(employee: DirectoryEntry, date: NaiveDate, outcome: Reconciliation) -> Self {
        Self {
            user_id: employee.id,
            employee_number: employee.employee_number,
            full_name: employee.full_name,
            department: or_na(employee.department),
            role: or_na(employee.role),
            cost_center: or_na(employee.cost_center),
            date: date.format("%Y-%m-%d").to_string(),
            scheduled_check_in: fmt_time(outcome.scheduled_check_in),
            actual_check_in: fmt_time(outcome.actual_check_in),
            check_out: fmt_time(outcome.check_out),
            status: outcome.status,
            delay_minutes: outcome.delay_minutes,
        }
    }
}

fn or_na(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn fmt_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// The cost center to narrow on, or `None` when the whole directory is visible.
pub fn effective_cost_center(filter: Option<&str>) -> Option<&str> {
    filter.filter(|cc| !PRIVILEGED_COST_CENTERS.contains(*cc))
}

/// Duplicate assignments for a day resolve to the lowest id.
fn index_assignments(assignments: Vec<AssignedShift>) -> HashMap<u64, AssignedShift> {
    let mut by_employee: HashMap<u64, AssignedShift> = HashMap::with_capacity(assignments.len());
    for assignment in assignments {
        match by_employee.get(&assignment.employee_id) {
            Some(kept) if kept.id <= assignment.id => {}
            _ => {
                by_employee.insert(assignment.employee_id, assignment);
            }
        }
    }
    by_employee
}

/// Several records on one day resolve to the earliest check-in, then the lowest id.
fn index_attendance(records: Vec<AttendanceRecord>) -> HashMap<u64, AttendanceRecord> {
    let mut by_employee: HashMap<u64, AttendanceRecord> = HashMap::with_capacity(records.len());
    for record in records {
        match by_employee.get(&record.employee_id) {
            Some(kept) if (kept.check_in, kept.id) <= (record.check_in, record.id) => {}
            _ => {
                by_employee.insert(record.employee_id, record);
            }
        }
    }
    by_employee
}

/// Builds one row per employee of the population for `date`.
///
/// Rows follow directory order. Storage errors are returned as-is.
pub async fn generate_daily_report<S>(
    source: &S,
    date: NaiveDate,
    cost_center: Option<&str>,
) -> Result<Vec<ReportRow>, sqlx::Error>
where
    S: ReportSource + ?Sized,
{
    let filter = effective_cost_center(cost_center);
    match filter {
        Some(cc) => info!(%date, cost_center = cc, "Generating attendance report for cost center"),
        None => info!(%date, requested = ?cost_center, "Generating attendance report for all employees"),
    }

    let employees = source.list_employees(filter).await?;
    let assignments = index_assignments(source.assignments_for(date).await?);
    let records = index_attendance(source.attendance_for(date).await?);

    debug!(
        employees = employees.len(),
        assignments = assignments.len(),
        records = records.len(),
        "Report inputs loaded"
    );

    let report = employees
        .into_iter()
        .map(|employee| {
            let outcome = reconcile(
                date,
                assignments.get(&employee.id),
                records.get(&employee.id),
            );
            ReportRow::new(employee, date, outcome)
        })
        .collect();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;

    #[derive(Default)]
    struct InMemorySource {
        employees: Vec<DirectoryEntry>,
        assignments: Vec<AssignedShift>,
        records: Vec<AttendanceRecord>,
        fail: bool,
    }

    #[async_trait]
    impl ReportSource for InMemorySource {
        async fn list_employees(
            &self,
            cost_center: Option<&str>,
        ) -> Result<Vec<DirectoryEntry>, sqlx::Error> {
            if self.fail {
                return Err(sqlx::Error::PoolTimedOut);
            }
            Ok(self
                .employees
                .iter()
                .filter(|e| cost_center.is_none() || e.cost_center.as_deref() == cost_center)
                .cloned()
                .collect())
        }

        async fn assignments_for(
            &self,
            date: NaiveDate,
        ) -> Result<Vec<AssignedShift>, sqlx::Error> {
            Ok(self.assignments.iter().filter(|a| a.date == date).cloned().collect())
        }

        async fn attendance_for(
            &self,
            date: NaiveDate,
        ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
            Ok(self.records.iter().filter(|r| r.date == date).cloned().collect())
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()
    }

    fn at(hms: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("2025-07-31 {hms}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn employee(id: u64, cost_center: Option<&str>) -> DirectoryEntry {
        DirectoryEntry {
            id,
            employee_number: format!("E{id}"),
            full_name: format!("Employee {id}"),
            department: Some("Operaciones".into()),
            role: None,
            cost_center: cost_center.map(String::from),
        }
    }

    fn assignment(id: u64, employee_id: u64, entry: &str) -> AssignedShift {
        AssignedShift {
            id,
            employee_id,
            date: day(),
            entry_time: Some(NaiveTime::parse_from_str(entry, "%H:%M:%S").unwrap()),
        }
    }

    fn record(id: u64, employee_id: u64, check_in: &str) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id,
            employee_number: format!("E{employee_id}"),
            date: day(),
            check_in: at(check_in),
            check_out: None,
        }
    }

    fn sample() -> InMemorySource {
        InMemorySource {
            employees: vec![
                employee(1, Some("CC_X")),
                employee(2, None),
                employee(3, Some("C003")),
                employee(4, Some("cc_x")),
            ],
            assignments: vec![assignment(10, 1, "09:00:00"), assignment(11, 3, "08:00:00")],
            records: vec![record(20, 1, "09:10:00")],
            fail: false,
        }
    }

    #[actix_web::test]
    async fn one_row_per_employee_in_directory_order() {
        let rows = generate_daily_report(&sample(), day(), None).await.unwrap();
        let ids: Vec<u64> = rows.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[actix_web::test]
    async fn classifies_the_reference_scenarios() {
        let rows = generate_daily_report(&sample(), day(), None).await.unwrap();

        let e1 = &rows[0];
        assert_eq!(e1.status, AttendanceStatus::Late);
        assert_eq!(e1.delay_minutes, 10);
        assert_eq!(e1.scheduled_check_in, "09:00:00");
        assert_eq!(e1.actual_check_in, "09:10:00");
        assert_eq!(e1.check_out, NOT_AVAILABLE);

        let e2 = &rows[1];
        assert_eq!(e2.status, AttendanceStatus::Unassigned);
        assert_eq!(e2.delay_minutes, 0);
        assert_eq!(e2.scheduled_check_in, NOT_AVAILABLE);
        assert_eq!(e2.actual_check_in, NOT_AVAILABLE);
        assert_eq!(e2.check_out, NOT_AVAILABLE);
        assert_eq!(e2.cost_center, NOT_AVAILABLE);
        assert_eq!(e2.role, NOT_AVAILABLE);
        assert_eq!(e2.date, "2025-07-31");

        let e3 = &rows[2];
        assert_eq!(e3.status, AttendanceStatus::Absent);
        assert_eq!(e3.scheduled_check_in, "08:00:00");
        assert_eq!(e3.actual_check_in, NOT_AVAILABLE);
    }

    #[actix_web::test]
    async fn privileged_cost_center_sees_everyone() {
        let source = sample();
        let all = generate_daily_report(&source, day(), None).await.unwrap();
        let privileged = generate_daily_report(&source, day(), Some("C003")).await.unwrap();
        let hr = generate_daily_report(&source, day(), Some("CC_RH_01")).await.unwrap();
        assert_eq!(all, privileged);
        assert_eq!(all, hr);
    }

    #[actix_web::test]
    async fn other_cost_centers_are_narrowed_exactly() {
        let rows = generate_daily_report(&sample(), day(), Some("CC_X")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cost_center, "CC_X");

        let none = generate_daily_report(&sample(), day(), Some("UNKNOWN")).await.unwrap();
        assert!(none.is_empty());

        let padded = generate_daily_report(&sample(), day(), Some(" CC_X ")).await.unwrap();
        assert!(padded.is_empty());

        let empty = generate_daily_report(&sample(), day(), Some("")).await.unwrap();
        assert!(empty.is_empty());
    }

    #[actix_web::test]
    async fn other_days_are_ignored() {
        let mut source = sample();
        source.records[0].date = day().succ_opt().unwrap();
        let rows = generate_daily_report(&source, day(), None).await.unwrap();
        assert_eq!(rows[0].status, AttendanceStatus::Absent);
    }

    #[actix_web::test]
    async fn earliest_check_in_wins_among_duplicates() {
        let mut source = sample();
        source.records = vec![
            record(30, 1, "13:00:00"),
            record(31, 1, "09:02:00"),
            record(32, 1, "09:02:00"),
        ];
        let rows = generate_daily_report(&source, day(), None).await.unwrap();
        assert_eq!(rows[0].status, AttendanceStatus::Present);
        assert_eq!(rows[0].actual_check_in, "09:02:00");
        assert_eq!(rows[0].delay_minutes, 2);
    }

    #[actix_web::test]
    async fn lowest_assignment_id_wins_among_duplicates() {
        let mut source = sample();
        source.assignments = vec![assignment(50, 1, "10:00:00"), assignment(40, 1, "09:00:00")];
        let rows = generate_daily_report(&source, day(), None).await.unwrap();
        assert_eq!(rows[0].scheduled_check_in, "09:00:00");
    }

    #[actix_web::test]
    async fn storage_failure_propagates() {
        let source = InMemorySource {
            fail: true,
            ..Default::default()
        };
        let result = generate_daily_report(&source, day(), None).await;
        assert!(matches!(result, Err(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn exemption_set_disables_filter() {
        assert_eq!(effective_cost_center(None), None);
        assert_eq!(effective_cost_center(Some("C003")), None);
        assert_eq!(effective_cost_center(Some("CC_RH_01")), None);
        assert_eq!(effective_cost_center(Some("c003")), Some("c003"));
        assert_eq!(effective_cost_center(Some("CC_X")), Some("CC_X"));
    }

    #[test]
    fn rows_serialize_with_report_keys() {
        let row = ReportRow::new(
            employee(7, Some("CC_X")),
            day(),
            reconcile(day(), None, None),
        );
        let value = serde_json::to_value(&row).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "user_id",
                "employee_number",
                "full_name",
                "department",
                "role",
                "cost_center",
                "date",
                "scheduled_check_in",
                "actual_check_in",
                "check_out",
                "status",
                "delay_minutes"
            ]
        );
        assert_eq!(value["status"], "Unassigned");
    }
}
