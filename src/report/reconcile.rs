use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use super::source::AssignedShift;
use crate::model::attendance::AttendanceRecord;

/// Arrivals up to this many whole minutes after the scheduled entry still count as present.
pub const LATE_THRESHOLD_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
pub enum AttendanceStatus {
    /// No shift was assigned for the day
    Unassigned,
    /// A shift was assigned but nobody checked in
    Absent,
    Present,
    Late,
}

/// Outcome of correlating one employee's shift and attendance for a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub status: AttendanceStatus,
    pub scheduled_check_in: Option<NaiveTime>,
    pub actual_check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub delay_minutes: i64,
}

pub fn reconcile(
    date: NaiveDate,
    assignment: Option<&AssignedShift>,
    record: Option<&AttendanceRecord>,
) -> Reconciliation {
    let scheduled_check_in = assignment.and_then(|a| a.entry_time);

    let mut status = match scheduled_check_in {
        Some(_) => AttendanceStatus::Absent,
        None => AttendanceStatus::Unassigned,
    };
    let mut delay_minutes = 0;

    let Some(record) = record else {
        return Reconciliation {
            status,
            scheduled_check_in,
            actual_check_in: None,
            check_out: None,
            delay_minutes,
        };
    };

    status = AttendanceStatus::Present;

    if let Some(scheduled) = scheduled_check_in {
        // naive local comparison, whole minutes truncated
        let delay = record.check_in - date.and_time(scheduled);
        if delay > TimeDelta::zero() {
            delay_minutes = delay.num_minutes();
            if delay_minutes > LATE_THRESHOLD_MINUTES {
                status = AttendanceStatus::Late;
            }
        }
    }

    Reconciliation {
        status,
        scheduled_check_in,
        actual_check_in: Some(record.check_in.time()),
        check_out: record.check_out.map(|t| t.time()),
        delay_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()
    }

    fn at(hms: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("2025-07-31 {hms}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn shift(entry: &str) -> AssignedShift {
        AssignedShift {
            id: 1,
            employee_id: 1,
            date: day(),
            entry_time: Some(NaiveTime::parse_from_str(entry, "%H:%M:%S").unwrap()),
        }
    }

    fn record(check_in: &str, check_out: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            employee_id: 1,
            employee_number: "EMP-001".into(),
            date: day(),
            check_in: at(check_in),
            check_out: check_out.map(at),
        }
    }

    #[test]
    fn nothing_known_is_unassigned() {
        let r = reconcile(day(), None, None);
        assert_eq!(r.status, AttendanceStatus::Unassigned);
        assert_eq!(r.delay_minutes, 0);
        assert!(r.scheduled_check_in.is_none());
        assert!(r.actual_check_in.is_none());
        assert!(r.check_out.is_none());
    }

    #[test]
    fn assignment_without_record_is_absent() {
        let r = reconcile(day(), Some(&shift("08:00:00")), None);
        assert_eq!(r.status, AttendanceStatus::Absent);
        assert_eq!(r.scheduled_check_in, NaiveTime::from_hms_opt(8, 0, 0));
        assert!(r.actual_check_in.is_none());
        assert_eq!(r.delay_minutes, 0);
    }

    #[test]
    fn assignment_without_shift_type_stays_unassigned() {
        let mut unresolved = shift("08:00:00");
        unresolved.entry_time = None;
        let r = reconcile(day(), Some(&unresolved), None);
        assert_eq!(r.status, AttendanceStatus::Unassigned);
    }

    #[test]
    fn record_without_assignment_is_present_with_no_delay() {
        let r = reconcile(day(), None, Some(&record("11:45:00", None)));
        assert_eq!(r.status, AttendanceStatus::Present);
        assert_eq!(r.delay_minutes, 0);
        assert_eq!(r.actual_check_in, NaiveTime::from_hms_opt(11, 45, 0));
    }

    #[test]
    fn ten_minutes_late_is_late() {
        let r = reconcile(day(), Some(&shift("09:00:00")), Some(&record("09:10:00", None)));
        assert_eq!(r.status, AttendanceStatus::Late);
        assert_eq!(r.delay_minutes, 10);
    }

    #[test]
    fn three_minutes_late_is_present_with_delay() {
        let r = reconcile(day(), Some(&shift("09:00:00")), Some(&record("09:03:00", None)));
        assert_eq!(r.status, AttendanceStatus::Present);
        assert_eq!(r.delay_minutes, 3);
    }

    #[test]
    fn threshold_boundary_uses_whole_minutes() {
        let five = reconcile(day(), Some(&shift("09:00:00")), Some(&record("09:05:59", None)));
        assert_eq!(five.status, AttendanceStatus::Present);
        assert_eq!(five.delay_minutes, 5);

        let six = reconcile(day(), Some(&shift("09:00:00")), Some(&record("09:06:00", None)));
        assert_eq!(six.status, AttendanceStatus::Late);
        assert_eq!(six.delay_minutes, 6);
    }

    #[test]
    fn early_arrival_has_zero_delay() {
        let r = reconcile(day(), Some(&shift("09:00:00")), Some(&record("08:40:00", None)));
        assert_eq!(r.status, AttendanceStatus::Present);
        assert_eq!(r.delay_minutes, 0);
    }

    #[test]
    fn closed_record_reports_check_out() {
        let r = reconcile(
            day(),
            Some(&shift("09:00:00")),
            Some(&record("08:59:00", Some("18:02:30"))),
        );
        assert_eq!(r.check_out, NaiveTime::from_hms_opt(18, 2, 30));
    }
}
