use crate::auth::auth::AuthUser;
use crate::db::is_duplicate;
use crate::model::department::Department;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Recursos Humanos")]
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Departments ordered by name", body = [Department]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No departments", body = Object, example = json!({
            "message": "No departments found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let departments =
        sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY name")
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to list departments");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    if departments.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No departments found"
        })));
    }

    Ok(HttpResponse::Ok().json(departments))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Duplicate name", body = Object, example = json!({
            "message": "A department with this name already exists"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartment>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Department name must not be empty"
        })));
    }

    let result = sqlx::query("INSERT INTO departments (name) VALUES (?)")
        .bind(name)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(done) => {
            let department = Department {
                id: done.last_insert_id(),
                name: name.to_string(),
            };
            tracing::info!(department_id = department.id, "Department created");
            Ok(HttpResponse::Created().json(department))
        }
        Err(e) if is_duplicate(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "A department with this name already exists"
        }))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create department");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}
