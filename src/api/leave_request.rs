use crate::auth::auth::AuthUser;
use crate::model::leave_request::{AdditionalEvent, EventStatus};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

const EVENT_COLUMNS: &str =
    "id, employee_id, event_type, start_date, end_date, requested_hours, reason, status";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEvent {
    /// Must be the caller's own id
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "VACATION")]
    pub event_type: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = 4.5)]
    pub requested_hours: Option<f64>,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEventStatus {
    /// APPROVED, REJECTED or PENDING, any case
    #[schema(example = "approved")]
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EventFilter {
    /// Substring of the status
    #[schema(example = "PEND")]
    pub status: Option<String>,
}

fn validate_event(payload: &CreateEvent) -> Result<(), &'static str> {
    if payload.event_type.trim().is_empty() {
        return Err("event_type must not be empty");
    }
    if let Some(end) = payload.end_date {
        if payload.start_date > end {
            return Err("start_date cannot be after end_date");
        }
    }
    if let Some(hours) = payload.requested_hours {
        if !hours.is_finite() || hours < 0.0 {
            return Err("requested_hours must be a positive number");
        }
    }
    Ok(())
}

/* =========================
Create event request
========================= */
#[utoipa::path(
    post,
    path = "/api/management/events",
    request_body(
        content = CreateEvent,
        description = "Leave or permission request",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Event submitted", body = AdditionalEvent),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Request for another employee", body = Object, example = json!({
            "message": "You can only create events for yourself"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Management"
)]
pub async fn create_event(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEvent>,
) -> actix_web::Result<impl Responder> {
    if payload.employee_id != auth.employee_id {
        return Ok(HttpResponse::Forbidden().json(serde_json::json!({
            "message": "You can only create events for yourself"
        })));
    }

    if let Err(message) = validate_event(&payload) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": message
        })));
    }

    let employee_id = auth.employee_id;
    let status = EventStatus::Pending.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO additional_events
            (employee_id, event_type, start_date, end_date, requested_hours, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.event_type.trim())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.requested_hours)
    .bind(payload.reason.as_deref())
    .bind(&status)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create event");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let payload = payload.into_inner();
    let event = AdditionalEvent {
        id: result.last_insert_id(),
        employee_id,
        event_type: payload.event_type.trim().to_string(),
        start_date: payload.start_date,
        end_date: payload.end_date,
        requested_hours: payload.requested_hours,
        reason: payload.reason,
        status,
    };

    tracing::info!(event_id = event.id, employee_id, "Event submitted");
    Ok(HttpResponse::Created().json(event))
}

/// Caller's own events, newest first
#[utoipa::path(
    get,
    path = "/api/management/events/mine",
    responses(
        (status = 200, description = "Events", body = [AdditionalEvent]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Management"
)]
pub async fn my_events(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id;

    let sql = format!(
        "SELECT {} FROM additional_events WHERE employee_id = ? ORDER BY start_date DESC, id DESC",
        EVENT_COLUMNS
    );

    let events = sqlx::query_as::<_, AdditionalEvent>(&sql)
        .bind(employee_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch events");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(events))
}

/* =========================
Approve / reject (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/management/events/{event_id}/status",
    params(
        ("event_id" = u64, Path, description = "ID of the event to update")
    ),
    request_body = UpdateEventStatus,
    responses(
        (status = 200, description = "Status updated", body = AdditionalEvent),
        (status = 400, description = "Unknown status", body = Object, example = json!({
            "message": "Invalid status. Allowed: APPROVED, REJECTED, PENDING"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Event not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Management"
)]
pub async fn update_event_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEventStatus>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let event_id = path.into_inner();

    let Ok(status) = EventStatus::from_str(payload.status.trim()) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid status. Allowed: APPROVED, REJECTED, PENDING"
        })));
    };

    let sql = format!("SELECT {} FROM additional_events WHERE id = ?", EVENT_COLUMNS);
    let event = sqlx::query_as::<_, AdditionalEvent>(&sql)
        .bind(event_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, event_id, "Failed to fetch event");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(mut event) = event else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Event not found"
        })));
    };

    sqlx::query("UPDATE additional_events SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(event_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, event_id, "Failed to update event status");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    tracing::info!(event_id, %status, reviewer = auth.employee_id, "Event status updated");

    event.status = status.to_string();
    Ok(HttpResponse::Ok().json(event))
}

/// All events, optionally filtered by status (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/management/events",
    params(EventFilter),
    responses(
        (status = 200, description = "Events", body = [AdditionalEvent]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Management"
)]
pub async fn list_events(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EventFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let where_sql = if status.is_some() {
        " WHERE status LIKE ?"
    } else {
        ""
    };
    let sql = format!(
        "SELECT {} FROM additional_events{} ORDER BY start_date DESC, id DESC",
        EVENT_COLUMNS, where_sql
    );

    let mut q = sqlx::query_as::<_, AdditionalEvent>(&sql);
    if let Some(status) = status {
        q = q.bind(format!("%{}%", status));
    }

    let events = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list events");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(events))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(start: &str, end: Option<&str>, hours: Option<f64>) -> CreateEvent {
        CreateEvent {
            employee_id: 1,
            event_type: "VACATION".into(),
            start_date: start.parse().unwrap(),
            end_date: end.map(|e| e.parse().unwrap()),
            requested_hours: hours,
            reason: None,
        }
    }

    #[test]
    fn valid_event_passes() {
        assert!(validate_event(&event("2026-01-01", Some("2026-01-03"), None)).is_ok());
        assert!(validate_event(&event("2026-01-01", None, Some(4.0))).is_ok());
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_eq!(
            validate_event(&event("2026-01-05", Some("2026-01-03"), None)),
            Err("start_date cannot be after end_date")
        );
    }

    #[test]
    fn negative_hours_are_rejected() {
        assert!(validate_event(&event("2026-01-01", None, Some(-1.0))).is_err());
        assert!(validate_event(&event("2026-01-01", None, Some(f64::NAN))).is_err());
    }
}
