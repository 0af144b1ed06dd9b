use crate::api::shift::Pagination;
use crate::auth::auth::AuthUser;
use crate::db::is_duplicate;
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRole {
    #[schema(example = "RH")]
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/api/admin/roles",
    request_body = CreateRole,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Duplicate role name")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn create_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRole>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Role name must not be empty"
        })));
    }

    match sqlx::query("INSERT INTO roles (name) VALUES (?)")
        .bind(name)
        .execute(pool.get_ref())
        .await
    {
        Ok(done) => Ok(HttpResponse::Created().json(Role {
            id: done.last_insert_id(),
            name: name.to_string(),
        })),
        Err(e) if is_duplicate(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Role already exists"
        }))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create role");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/roles",
    params(Pagination),
    responses(
        (status = 200, description = "Roles", body = [Role]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_roles(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<Pagination>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (skip, limit) = query.bounds();

    let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(skip)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list roles");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(roles))
}
