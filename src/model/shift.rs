use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named shift with its scheduled entry and exit times.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ShiftType {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Morning")]
    pub name: String,
    #[schema(example = "09:00:00", value_type = String)]
    pub entry_time: NaiveTime,
    #[schema(example = "18:00:00", value_type = String)]
    pub exit_time: NaiveTime,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ShiftAssignment {
    pub id: u64,
    pub employee_id: u64,
    pub shift_type_id: u64,
    #[schema(example = "2025-07-31", value_type = String, format = "date")]
    pub date: NaiveDate,
}
