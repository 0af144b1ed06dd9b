use crate::auth::auth::AuthUser;
use crate::model::attendance::AttendanceRecord;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const RECORD_COLUMNS: &str = "id, employee_id, employee_number, date, check_in, check_out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceAction {
    CheckIn,
    CheckOut,
}

impl AttendanceAction {
    pub fn message(&self) -> &'static str {
        match self {
            AttendanceAction::CheckIn => "Check-in registered",
            AttendanceAction::CheckOut => "Check-out registered",
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceOutcome {
    pub action: AttendanceAction,
    #[schema(example = "Check-in registered")]
    pub message: String,
    pub record: AttendanceRecord,
}

impl AttendanceOutcome {
    fn new(action: AttendanceAction, record: AttendanceRecord) -> Self {
        Self {
            action,
            message: action.message().to_string(),
            record,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AttendanceRange {
    /// Inclusive lower bound
    #[schema(example = "2025-07-01", value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound
    #[schema(example = "2025-07-31", value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

/// Local server time, second precision.
pub fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// A check-out can never be recorded before its check-in.
pub fn check_out_allowed(record: &AttendanceRecord, now: NaiveDateTime) -> bool {
    record.is_open() && now >= record.check_in
}

async fn fetch_record(pool: &MySqlPool, id: u64) -> Result<AttendanceRecord, sqlx::Error> {
    let sql = format!("SELECT {} FROM attendance_records WHERE id = ?", RECORD_COLUMNS);
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Latest record of the day that has no check-out yet.
pub async fn find_open_record(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM attendance_records
        WHERE employee_id = ? AND date = ? AND check_out IS NULL
        ORDER BY check_in DESC, id DESC
        LIMIT 1
        "#,
        RECORD_COLUMNS
    );
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(date)
        .fetch_optional(pool)
        .await
}

async fn insert_check_in(
    pool: &MySqlPool,
    employee_id: u64,
    employee_number: &str,
    now: NaiveDateTime,
) -> Result<AttendanceRecord, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance_records (employee_id, employee_number, date, check_in)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(employee_number)
    .bind(now.date())
    .bind(now)
    .execute(pool)
    .await?;

    fetch_record(pool, result.last_insert_id()).await
}

async fn close_record(
    pool: &MySqlPool,
    record_id: u64,
    now: NaiveDateTime,
) -> Result<AttendanceRecord, sqlx::Error> {
    sqlx::query("UPDATE attendance_records SET check_out = ? WHERE id = ?")
        .bind(now)
        .bind(record_id)
        .execute(pool)
        .await?;

    fetch_record(pool, record_id).await
}

pub async fn employee_number_of(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT employee_number FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await
}

/// Closes today's open record if there is one, otherwise opens a new one.
/// Used by the kiosk flows where a single scan means "I'm here / I'm leaving".
pub async fn register_attendance(
    pool: &MySqlPool,
    employee_id: u64,
    employee_number: &str,
) -> Result<AttendanceOutcome, sqlx::Error> {
    let now = local_now();

    match find_open_record(pool, employee_id, now.date()).await? {
        Some(open) => {
            let record = close_record(pool, open.id, now.max(open.check_in)).await?;
            tracing::info!(employee_id, record_id = record.id, "Check-out registered");
            Ok(AttendanceOutcome::new(AttendanceAction::CheckOut, record))
        }
        None => {
            let record = insert_check_in(pool, employee_id, employee_number, now).await?;
            tracing::info!(employee_id, record_id = record.id, "Check-in registered");
            Ok(AttendanceOutcome::new(AttendanceAction::CheckIn, record))
        }
    }
}

fn internal_error(e: sqlx::Error, employee_id: u64, what: &str) -> actix_web::Error {
    tracing::error!(error = %e, employee_id, "{} failed", what);
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 201, description = "Checked in successfully", body = AttendanceOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Already checked in", body = Object, example = json!({
            "message": "There is already an open check-in for today"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id;
    let now = local_now();

    let open = find_open_record(pool.get_ref(), employee_id, now.date())
        .await
        .map_err(|e| internal_error(e, employee_id, "Check-in"))?;

    if open.is_some() {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "There is already an open check-in for today"
        })));
    }

    let employee_number = employee_number_of(pool.get_ref(), employee_id)
        .await
        .map_err(|e| internal_error(e, employee_id, "Check-in"))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Employee not found"))?;

    let record = insert_check_in(pool.get_ref(), employee_id, &employee_number, now)
        .await
        .map_err(|e| internal_error(e, employee_id, "Check-in"))?;

    tracing::info!(employee_id, record_id = record.id, "Check-in registered");
    Ok(HttpResponse::Created().json(AttendanceOutcome::new(AttendanceAction::CheckIn, record)))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceOutcome),
        (status = 400, description = "Check-out earlier than check-in", body = Object, example = json!({
            "message": "Check-out time cannot be earlier than check-in time"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No open check-in for today", body = Object, example = json!({
            "message": "No open check-in found for today"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id;
    let now = local_now();

    let open = find_open_record(pool.get_ref(), employee_id, now.date())
        .await
        .map_err(|e| internal_error(e, employee_id, "Check-out"))?;

    let Some(open) = open else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No open check-in found for today"
        })));
    };

    if !check_out_allowed(&open, now) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Check-out time cannot be earlier than check-in time"
        })));
    }

    let record = close_record(pool.get_ref(), open.id, now)
        .await
        .map_err(|e| internal_error(e, employee_id, "Check-out"))?;

    tracing::info!(employee_id, record_id = record.id, "Check-out registered");
    Ok(HttpResponse::Ok().json(AttendanceOutcome::new(AttendanceAction::CheckOut, record)))
}

/// Caller's own attendance history, newest first.
#[utoipa::path(
    get,
    path = "/api/attendance/mine",
    params(AttendanceRange),
    responses(
        (status = 200, description = "Attendance records", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceRange>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id;

    let mut where_sql = String::from(" WHERE employee_id = ?");
    let mut dates: Vec<NaiveDate> = Vec::new();

    if let Some(start) = query.start_date {
        where_sql.push_str(" AND date >= ?");
        dates.push(start);
    }
    if let Some(end) = query.end_date {
        where_sql.push_str(" AND date <= ?");
        dates.push(end);
    }

    let sql = format!(
        "SELECT {} FROM attendance_records{} ORDER BY date DESC, check_in DESC",
        RECORD_COLUMNS, where_sql
    );

    let mut q = sqlx::query_as::<_, AttendanceRecord>(&sql).bind(employee_id);
    for date in dates {
        q = q.bind(date);
    }

    let records = q
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| internal_error(e, employee_id, "Attendance history"))?;

    Ok(HttpResponse::Ok().json(records))
}

/// Caller's most recent record for today, or null.
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record, null when there is none", body = AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id;
    let today = local_now().date();

    let sql = format!(
        r#"
        SELECT {}
        FROM attendance_records
        WHERE employee_id = ? AND date = ?
        ORDER BY check_in DESC, id DESC
        LIMIT 1
        "#,
        RECORD_COLUMNS
    );

    let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(today)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| internal_error(e, employee_id, "Today's attendance"))?;

    Ok(HttpResponse::Ok().json(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 31)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn record(check_in: NaiveDateTime, check_out: Option<NaiveDateTime>) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            employee_id: 1,
            employee_number: "EMP-001".into(),
            date: check_in.date(),
            check_in,
            check_out,
        }
    }

    #[test]
    fn check_out_after_entry_is_allowed() {
        assert!(check_out_allowed(&record(at(9, 0), None), at(18, 0)));
        assert!(check_out_allowed(&record(at(9, 0), None), at(9, 0)));
    }

    #[test]
    fn check_out_before_entry_is_refused() {
        assert!(!check_out_allowed(&record(at(9, 0), None), at(8, 59)));
    }

    #[test]
    fn closed_record_cannot_be_checked_out_again() {
        assert!(!check_out_allowed(
            &record(at(9, 0), Some(at(17, 0))),
            at(18, 0)
        ));
    }

    #[test]
    fn outcome_messages_follow_action() {
        let outcome = AttendanceOutcome::new(AttendanceAction::CheckOut, record(at(9, 0), None));
        assert_eq!(outcome.message, "Check-out registered");
        assert_eq!(
            serde_json::to_value(outcome.action).unwrap(),
            serde_json::json!("check_out")
        );
    }

    #[test]
    fn local_now_has_no_fraction() {
        assert_eq!(local_now().nanosecond(), 0);
    }
}
