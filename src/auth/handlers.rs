use crate::{
    auth::{firebase::IdentityVerifier, jwt::generate_session_token},
    config::Config,
    models::{SessionReq, SessionResponse, SessionUserSql},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Exchanges a Firebase ID token for a session token.
#[utoipa::path(
    post,
    path = "/auth/session",
    request_body = SessionReq,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 401, description = "Invalid token or unknown employee", body = Object, example = json!({
            "message": "No employee is registered with this email"
        })),
        (status = 403, description = "Token carries no email"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_session", skip(req, pool, config, verifier))]
pub async fn create_session(
    req: web::Json<SessionReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    verifier: web::Data<dyn IdentityVerifier>,
) -> actix_web::Result<impl Responder> {
    info!("Session request received");

    let identity = verifier.verify(&req.firebase_token).await?;
    let email = identity.require_email()?;
    debug!(uid = %identity.sub, email_verified = identity.email_verified, "Firebase token verified");

    let user = sqlx::query_as::<_, SessionUserSql>(
        r#"
        SELECT e.id, e.email, r.name AS role
        FROM employees e
        LEFT JOIN roles r ON r.id = e.role_id
        WHERE e.email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Database error while fetching employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(user) = user else {
        info!("Session refused: no employee with this email");
        return Ok(HttpResponse::Unauthorized().json(json!({
            "message": "No employee is registered with this email"
        })));
    };

    let (access_token, claims) = generate_session_token(
        user.id,
        user.email,
        user.role,
        &config.jwt_secret,
        config.session_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign session token");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    info!(employee_id = user.id, jti = %claims.jti, "Session issued");

    Ok(HttpResponse::Ok().json(SessionResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.session_ttl,
    }))
}
