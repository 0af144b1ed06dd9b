use crate::auth::auth::AuthUser;
use crate::db::is_duplicate;
use crate::model::employee::Employee;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

const EMPLOYEE_COLUMNS: &str =
    "e.id, e.employee_number, e.full_name, e.email, e.cost_center, e.role_id, e.department_id";

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_number: String,
    #[schema(example = "Ana Torres")]
    pub full_name: String,
    #[schema(example = "ana.torres@company.com", format = "email")]
    pub email: String,
    #[schema(example = "C003")]
    pub cost_center: Option<String>,
    #[schema(example = 2)]
    pub role_id: Option<u64>,
    #[schema(example = 10)]
    pub department_id: Option<u64>,
}

/// Everything needed to insert an employee row, including the kiosk
/// enrollment extras.
#[derive(Debug, Default)]
pub struct NewEmployee {
    pub employee_number: String,
    pub full_name: String,
    pub email: String,
    pub cost_center: Option<String>,
    pub role_id: Option<u64>,
    pub department_id: Option<u64>,
    pub firebase_uid: Option<String>,
    pub fingerprint_template: Option<Vec<u8>>,
    pub face_template: Option<String>,
}

impl From<CreateEmployee> for NewEmployee {
    fn from(c: CreateEmployee) -> Self {
        NewEmployee {
            employee_number: c.employee_number.trim().to_string(),
            full_name: c.full_name.trim().to_string(),
            email: c.email.trim().to_string(),
            cost_center: c.cost_center,
            role_id: c.role_id,
            department_id: c.department_id,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub department_id: Option<u64>,
    /// Matches employee number or full name
    pub q: Option<String>,
    /// 1..=200, default 50
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl UserQuery {
    pub fn bounds(&self) -> (u32, u32) {
        (self.limit.unwrap_or(50).clamp(1, 200), self.offset.unwrap_or(0))
    }

    fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct UserWithDepartment {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "EMP-001")]
    pub employee_number: String,
    #[schema(example = "Ana Torres")]
    pub full_name: String,
    #[schema(example = "ana.torres@company.com")]
    pub email: String,
    pub cost_center: Option<String>,
    #[schema(example = 10)]
    pub department_id: u64,
    #[schema(example = "Recursos Humanos")]
    pub department_name: String,
}

enum FilterValue {
    U64(u64),
    Str(String),
}

/// WHERE fragment and bindings shared by both user listings.
fn user_filter(query: &UserQuery) -> (String, Vec<FilterValue>) {
    let mut conditions = Vec::new();
    let mut bindings = Vec::new();

    if let Some(department_id) = query.department_id {
        conditions.push("e.department_id = ?");
        bindings.push(FilterValue::U64(department_id));
    }

    if let Some(search) = query.search() {
        conditions.push("(e.employee_number LIKE ? OR e.full_name LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bindings)
}

pub async fn insert_employee(pool: &MySqlPool, new: NewEmployee) -> Result<Employee, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_number, full_name, email, cost_center, role_id, department_id,
         firebase_uid, fingerprint_template, face_template)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.employee_number)
    .bind(&new.full_name)
    .bind(&new.email)
    .bind(new.cost_center.as_deref())
    .bind(new.role_id)
    .bind(new.department_id)
    .bind(new.firebase_uid.as_deref())
    .bind(new.fingerprint_template.as_deref())
    .bind(new.face_template.as_deref())
    .execute(pool)
    .await?;

    Ok(Employee {
        id: result.last_insert_id(),
        employee_number: new.employee_number,
        full_name: new.full_name,
        email: new.email,
        cost_center: new.cost_center,
        role_id: new.role_id,
        department_id: new.department_id,
    })
}

pub async fn department_exists(pool: &MySqlPool, department_id: u64) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, u64>("SELECT id FROM departments WHERE id = ?")
        .bind(department_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/admin/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Duplicate employee number or email", body = Object, example = json!({
            "message": "Employee number or email already registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let new = NewEmployee::from(payload.into_inner());
    if new.employee_number.is_empty() || new.full_name.is_empty() || new.email.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "employee_number, full_name and email are required"
        })));
    }

    match insert_employee(pool.get_ref(), new).await {
        Ok(employee) => {
            info!(employee_id = employee.id, "Employee created");
            Ok(HttpResponse::Created().json(employee))
        }
        Err(e) if is_duplicate(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Employee number or email already registered"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create employee");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/admin/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = path.into_inner();
    auth.require_self_or_admin(employee_id)?;

    let sql = format!("SELECT {} FROM employees e WHERE e.id = ?", EMPLOYEE_COLUMNS);
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Directory listing, newest first
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Employees", body = [Employee]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (limit, offset) = query.bounds();
    let (where_clause, bindings) = user_filter(&query);

    let sql = format!(
        "SELECT {} FROM employees e {} ORDER BY e.id DESC LIMIT ? OFFSET ?",
        EMPLOYEE_COLUMNS, where_clause
    );
    debug!(sql = %sql, limit, offset, "Fetching users");

    let mut data_query = sqlx::query_as::<_, Employee>(&sql);
    for b in bindings {
        data_query = match b {
            FilterValue::U64(v) => data_query.bind(v),
            FilterValue::Str(s) => data_query.bind(s),
        };
    }

    let users = data_query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %sql, "Failed to fetch users");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(users))
}

/// Same listing, restricted to employees with a department and carrying its name
#[utoipa::path(
    get,
    path = "/api/users/with-dept",
    params(UserQuery),
    responses(
        (status = 200, description = "Employees with department", body = [UserWithDepartment]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users_with_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (limit, offset) = query.bounds();
    let (where_clause, bindings) = user_filter(&query);

    let sql = format!(
        r#"
        SELECT e.id, e.employee_number, e.full_name, e.email, e.cost_center,
               d.id AS department_id, d.name AS department_name
        FROM employees e
        INNER JOIN departments d ON d.id = e.department_id
        {}
        ORDER BY e.id DESC
        LIMIT ? OFFSET ?
        "#,
        where_clause
    );
    debug!(sql = %sql, limit, offset, "Fetching users with department");

    let mut data_query = sqlx::query_as::<_, UserWithDepartment>(&sql);
    for b in bindings {
        data_query = match b {
            FilterValue::U64(v) => data_query.bind(v),
            FilterValue::Str(s) => data_query.bind(s),
        };
    }

    let users = data_query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %sql, "Failed to fetch users with department");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(users))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(department_id: Option<u64>, q: Option<&str>, limit: Option<u32>) -> UserQuery {
        UserQuery {
            department_id,
            q: q.map(String::from),
            limit,
            offset: None,
        }
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(query(None, None, None).bounds(), (50, 0));
        assert_eq!(query(None, None, Some(0)).bounds(), (1, 0));
        assert_eq!(query(None, None, Some(1000)).bounds(), (200, 0));
    }

    #[test]
    fn no_filters_means_no_where() {
        let (sql, bindings) = user_filter(&query(None, Some("   "), None));
        assert!(sql.is_empty());
        assert!(bindings.is_empty());
    }

    #[test]
    fn search_matches_number_and_name() {
        let (sql, bindings) = user_filter(&query(Some(3), Some("ana"), None));
        assert_eq!(
            sql,
            "WHERE e.department_id = ? AND (e.employee_number LIKE ? OR e.full_name LIKE ?)"
        );
        assert_eq!(bindings.len(), 3);
        assert!(matches!(&bindings[1], FilterValue::Str(s) if s == "%ana%"));
    }

    #[test]
    fn create_payload_is_trimmed() {
        let new = NewEmployee::from(CreateEmployee {
            employee_number: " EMP-9 ".into(),
            full_name: "Luis ".into(),
            email: " luis@company.com".into(),
            cost_center: None,
            role_id: None,
            department_id: Some(1),
        });
        assert_eq!(new.employee_number, "EMP-9");
        assert_eq!(new.full_name, "Luis");
        assert_eq!(new.email, "luis@company.com");
        assert!(new.face_template.is_none());
    }
}
