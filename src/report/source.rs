use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{FromRow, MySqlPool};

use crate::model::attendance::AttendanceRecord;

/// Directory row with department and role names already resolved.
#[derive(Debug, Clone, FromRow)]
pub struct DirectoryEntry {
    pub id: u64,
    pub employee_number: String,
    pub full_name: String,
    pub department: Option<String>,
    pub role: Option<String>,
    pub cost_center: Option<String>,
}

/// A shift assignment joined with its shift type. `entry_time` is `None`
/// when the referenced shift type no longer exists.
#[derive(Debug, Clone, FromRow)]
pub struct AssignedShift {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub entry_time: Option<NaiveTime>,
}

/// Read side of the daily report. Each lookup covers a whole day so a
/// report costs a fixed number of round trips.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Employees in directory order, narrowed to one cost center when given.
    async fn list_employees(
        &self,
        cost_center: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>, sqlx::Error>;

    async fn assignments_for(&self, date: NaiveDate) -> Result<Vec<AssignedShift>, sqlx::Error>;

    async fn attendance_for(&self, date: NaiveDate)
    -> Result<Vec<AttendanceRecord>, sqlx::Error>;
}

pub struct MySqlReportSource {
    pool: MySqlPool,
}

impl MySqlReportSource {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportSource for MySqlReportSource {
    async fn list_employees(
        &self,
        cost_center: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>, sqlx::Error> {
        // BINARY keeps the comparison case-sensitive under the default collation
        let where_clause = if cost_center.is_some() {
            "WHERE BINARY e.cost_center = ?"
        } else {
            ""
        };

        let sql = format!(
            r#"
            SELECT
                e.id,
                e.employee_number,
                e.full_name,
                d.name AS department,
                r.name AS role,
                e.cost_center
            FROM employees e
            LEFT JOIN departments d ON d.id = e.department_id
            LEFT JOIN roles r ON r.id = e.role_id
            {}
            ORDER BY e.id
            "#,
            where_clause
        );

        let mut query = sqlx::query_as::<_, DirectoryEntry>(&sql);
        if let Some(cost_center) = cost_center {
            query = query.bind(cost_center);
        }

        query.fetch_all(&self.pool).await
    }

    async fn assignments_for(&self, date: NaiveDate) -> Result<Vec<AssignedShift>, sqlx::Error> {
        sqlx::query_as::<_, AssignedShift>(
            r#"
            SELECT
                a.id,
                a.employee_id,
                a.date,
                s.entry_time
            FROM shift_assignments a
            LEFT JOIN shift_types s ON s.id = a.shift_type_id
            WHERE a.date = ?
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
    }

    async fn attendance_for(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, employee_id, employee_number, date, check_in, check_out
            FROM attendance_records
            WHERE date = ?
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
    }
}
