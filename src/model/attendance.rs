use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One check-in, optionally closed by a check-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "EMP-001")]
    pub employee_number: String,
    #[schema(example = "2025-07-31", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2025-07-31T09:03:00", value_type = String, format = "date-time")]
    pub check_in: NaiveDateTime,
    #[schema(example = "2025-07-31T18:01:00", value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }
}
