use crate::auth::auth::AuthUser;
use crate::db::is_duplicate;
use crate::model::shift::{ShiftAssignment, ShiftType};
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShiftType {
    #[schema(example = "Morning")]
    pub name: String,
    #[schema(example = "09:00:00", value_type = String)]
    pub entry_time: NaiveTime,
    #[schema(example = "18:00:00", value_type = String)]
    pub exit_time: NaiveTime,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Rows to skip
    pub skip: Option<u64>,
    /// Maximum rows to return
    pub limit: Option<u64>,
}

impl Pagination {
    pub fn bounds(&self) -> (u64, u64) {
        (self.skip.unwrap_or(0), self.limit.unwrap_or(100).clamp(1, 500))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAssignment {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub shift_type_id: u64,
    #[schema(example = "2025-07-31", value_type = String, format = "date")]
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignmentRange {
    #[param(value_type = String, format = "date", example = "2025-07-01")]
    pub start_date: NaiveDate,
    #[param(value_type = String, format = "date", example = "2025-07-31")]
    pub end_date: NaiveDate,
}

fn db_error(e: sqlx::Error, what: &str) -> actix_web::Error {
    error!(error = %e, "{}", what);
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// Create a shift type
#[utoipa::path(
    post,
    path = "/api/management/shifts",
    request_body = CreateShiftType,
    responses(
        (status = 201, description = "Shift type created", body = ShiftType),
        (status = 400, description = "Exit time equals entry time"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Management"
)]
pub async fn create_shift_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateShiftType>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Shift name must not be empty"
        })));
    }
    // overnight shifts (exit before entry) are allowed, zero-length ones are not
    if payload.entry_time == payload.exit_time {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Exit time must differ from entry time"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO shift_types (name, entry_time, exit_time)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(payload.entry_time)
    .bind(payload.exit_time)
    .execute(pool.get_ref())
    .await
    .map_err(|e| db_error(e, "Failed to create shift type"))?;

    let shift = ShiftType {
        id: result.last_insert_id(),
        name: name.to_string(),
        entry_time: payload.entry_time,
        exit_time: payload.exit_time,
    };

    info!(shift_type_id = shift.id, "Shift type created");
    Ok(HttpResponse::Created().json(shift))
}

/// List shift types
#[utoipa::path(
    get,
    path = "/api/management/shifts",
    params(Pagination),
    responses(
        (status = 200, description = "Shift types", body = [ShiftType]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Management"
)]
pub async fn list_shift_types(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<Pagination>,
) -> actix_web::Result<impl Responder> {
    let (skip, limit) = query.bounds();

    let shifts = sqlx::query_as::<_, ShiftType>(
        r#"
        SELECT id, name, entry_time, exit_time
        FROM shift_types
        ORDER BY id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| db_error(e, "Failed to list shift types"))?;

    Ok(HttpResponse::Ok().json(shifts))
}

/// Assign a shift to an employee for one day
#[utoipa::path(
    post,
    path = "/api/management/assignments",
    request_body = CreateAssignment,
    responses(
        (status = 201, description = "Shift assigned", body = ShiftAssignment),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee or shift type not found"),
        (status = 409, description = "Employee already has a shift that day", body = Object, example = json!({
            "message": "Employee already has a shift assigned on this date"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Management"
)]
pub async fn create_assignment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAssignment>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (employee_exists, shift_exists) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            EXISTS(SELECT 1 FROM employees WHERE id = ?),
            EXISTS(SELECT 1 FROM shift_types WHERE id = ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.shift_type_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| db_error(e, "Failed to validate assignment"))?;

    if employee_exists == 0 || shift_exists == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee or shift type not found"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO shift_assignments (employee_id, shift_type_id, date)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.shift_type_id)
    .bind(payload.date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(done) => {
            let assignment = ShiftAssignment {
                id: done.last_insert_id(),
                employee_id: payload.employee_id,
                shift_type_id: payload.shift_type_id,
                date: payload.date,
            };
            info!(
                assignment_id = assignment.id,
                employee_id = assignment.employee_id,
                date = %assignment.date,
                "Shift assigned"
            );
            Ok(HttpResponse::Created().json(assignment))
        }
        Err(e) if is_duplicate(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Employee already has a shift assigned on this date"
        }))),
        Err(e) => Err(db_error(e, "Failed to create assignment")),
    }
}

/// Shift assignments of one employee within a date range
#[utoipa::path(
    get,
    path = "/api/management/assignments/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        AssignmentRange
    ),
    responses(
        (status = 200, description = "Assignments", body = [ShiftAssignment]),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No assignments in range", body = Object, example = json!({
            "message": "No shift assignments found for this employee in the given range"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Management"
)]
pub async fn employee_assignments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<AssignmentRange>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(employee_id)?;

    if query.start_date > query.end_date {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    let assignments = sqlx::query_as::<_, ShiftAssignment>(
        r#"
        SELECT id, employee_id, shift_type_id, date
        FROM shift_assignments
        WHERE employee_id = ? AND date BETWEEN ? AND ?
        ORDER BY date
        "#,
    )
    .bind(employee_id)
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| db_error(e, "Failed to fetch assignments"))?;

    if assignments.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No shift assignments found for this employee in the given range"
        })));
    }

    Ok(HttpResponse::Ok().json(assignments))
}
