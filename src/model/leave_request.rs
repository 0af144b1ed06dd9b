use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Vacation, permission or any other request outside the normal shift.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AdditionalEvent {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "VACATION")]
    pub event_type: String,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    #[schema(example = 4.5)]
    pub requested_hours: Option<f64>,
    pub reason: Option<String>,
    #[schema(example = "PENDING")]
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum EventStatus {
    Pending,
    Approved,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_parses_any_case_and_stores_uppercase() {
        let status = EventStatus::from_str("approved").unwrap();
        assert_eq!(status, EventStatus::Approved);
        assert_eq!(status.to_string(), "APPROVED");
        assert_eq!(EventStatus::from_str("Rejected").unwrap(), EventStatus::Rejected);
        assert_eq!(EventStatus::Pending.to_string(), "PENDING");
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(EventStatus::from_str("CANCELLED").is_err());
        assert!(EventStatus::from_str("").is_err());
    }
}
