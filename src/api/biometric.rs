use crate::api::attendance::{AttendanceAction, AttendanceOutcome, register_attendance};
use crate::api::employee::{NewEmployee, department_exists, insert_employee};
use crate::auth::firebase::IdentityVerifier;
use crate::biometric::face::{FaceEmbedder, generate_template, verify_face};
use crate::biometric::fingerprint::fingerprints_match;
use crate::biometric::image::decode_base64_image;
use crate::biometric::vision::VisionClient;
use crate::db::is_duplicate;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::BiometricProfile;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

const PROFILE_COLUMNS: &str = "id, employee_number, face_template, fingerprint_template";

#[derive(Debug, Deserialize, ToSchema)]
pub struct FingerprintEnrollment {
    pub firebase_token: String,
    #[schema(example = "EMP-001")]
    pub employee_number: String,
    #[schema(example = "Ana Torres")]
    pub full_name: String,
    #[schema(example = 10)]
    pub department_id: u64,
    /// Template produced by the reader software
    pub fingerprint_data: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FingerprintTemplate {
    pub fingerprint_template: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FingerprintAttendance {
    #[schema(example = "EMP-001")]
    pub employee_number: String,
    /// When present it must equal the stored template
    pub fingerprint_data: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FaceEnrollment {
    /// Raw base64 or a `data:image/...;base64,` URL
    pub image_base64: String,
    pub firebase_token: String,
    #[schema(example = "EMP-001")]
    pub employee_number: String,
    #[schema(example = "Ana Torres")]
    pub full_name: String,
    #[schema(example = "ana.torres@company.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FaceCheck {
    pub image_base64: String,
    pub firebase_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FaceCheckResponse {
    pub verified: bool,
    #[schema(example = "Check-in registered")]
    pub message: String,
    pub action: AttendanceAction,
    pub record: AttendanceRecord,
}

impl From<AttendanceOutcome> for FaceCheckResponse {
    fn from(outcome: AttendanceOutcome) -> Self {
        FaceCheckResponse {
            verified: true,
            message: outcome.message,
            action: outcome.action,
            record: outcome.record,
        }
    }
}

/// Kiosk enrollments without an email get a placeholder address.
pub fn fallback_email(employee_number: &str) -> String {
    format!("{}@example.com", employee_number.trim())
}

fn internal_error(e: sqlx::Error, what: &str) -> actix_web::Error {
    error!(error = %e, "{}", what);
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

fn conflict() -> HttpResponse {
    HttpResponse::Conflict().json(json!({
        "message": "Employee number or email already registered"
    }))
}

async fn profile_by(
    pool: &MySqlPool,
    column: &str,
    value: &str,
) -> Result<Option<BiometricProfile>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM employees WHERE {} = ?",
        PROFILE_COLUMNS, column
    );
    sqlx::query_as::<_, BiometricProfile>(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
}

/* =========================
Fingerprint
========================= */
#[utoipa::path(
    post,
    path = "/fingerprint/enroll",
    request_body = FingerprintEnrollment,
    responses(
        (status = 201, description = "Employee enrolled", body = crate::model::employee::Employee),
        (status = 400, description = "Empty fingerprint"),
        (status = 401, description = "Invalid Firebase token"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Duplicate employee number or email")
    ),
    tag = "Biometrics"
)]
#[instrument(name = "fingerprint_enroll", skip_all, fields(employee_number = %payload.employee_number))]
pub async fn enroll_fingerprint(
    pool: web::Data<MySqlPool>,
    verifier: web::Data<dyn IdentityVerifier>,
    payload: web::Json<FingerprintEnrollment>,
) -> actix_web::Result<impl Responder> {
    let identity = verifier.verify(&payload.firebase_token).await?;

    if payload.fingerprint_data.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "fingerprint_data must not be empty"
        })));
    }

    let found = department_exists(pool.get_ref(), payload.department_id)
        .await
        .map_err(|e| internal_error(e, "Failed to look up department"))?;
    if !found {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Department not found"
        })));
    }

    let payload = payload.into_inner();
    let new = NewEmployee {
        email: identity
            .email
            .clone()
            .unwrap_or_else(|| fallback_email(&payload.employee_number)),
        employee_number: payload.employee_number.trim().to_string(),
        full_name: payload.full_name.trim().to_string(),
        department_id: Some(payload.department_id),
        firebase_uid: Some(identity.sub),
        fingerprint_template: Some(payload.fingerprint_data.into_bytes()),
        ..Default::default()
    };

    match insert_employee(pool.get_ref(), new).await {
        Ok(employee) => {
            info!(employee_id = employee.id, "Fingerprint enrolled");
            Ok(HttpResponse::Created().json(employee))
        }
        Err(e) if is_duplicate(&e) => Ok(conflict()),
        Err(e) => Err(internal_error(e, "Failed to enroll fingerprint")),
    }
}

#[utoipa::path(
    get,
    path = "/api/fingerprint/template/{employee_number}",
    params(
        ("employee_number" = String, Path, description = "Employee number")
    ),
    responses(
        (status = 200, description = "Stored template", body = FingerprintTemplate),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee or template not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Biometrics"
)]
pub async fn fingerprint_template(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_number = path.into_inner();

    let profile = profile_by(pool.get_ref(), "employee_number", &employee_number)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch fingerprint template"))?;

    let Some(profile) = profile else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    match profile
        .fingerprint_template
        .filter(|t| !t.is_empty())
        .map(String::from_utf8)
    {
        Some(Ok(template)) => Ok(HttpResponse::Ok().json(FingerprintTemplate {
            fingerprint_template: template,
        })),
        Some(Err(_)) => {
            warn!(%employee_number, "Stored fingerprint template is not UTF-8");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "No fingerprint template is registered for this employee"
        }))),
    }
}

#[utoipa::path(
    post,
    path = "/api/fingerprint/record-attendance",
    request_body = FingerprintAttendance,
    responses(
        (status = 200, description = "Attendance toggled", body = AttendanceOutcome),
        (status = 400, description = "No stored template"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Fingerprint does not match"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Biometrics"
)]
pub async fn fingerprint_attendance(
    pool: web::Data<MySqlPool>,
    payload: web::Json<FingerprintAttendance>,
) -> actix_web::Result<impl Responder> {
    let employee_number = payload.employee_number.trim();

    let profile = profile_by(pool.get_ref(), "employee_number", employee_number)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch employee"))?;

    let Some(profile) = profile else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    if let Some(captured) = payload.fingerprint_data.as_deref() {
        if !fingerprints_match(captured, profile.fingerprint_template.as_deref())? {
            return Ok(HttpResponse::Forbidden().json(json!({
                "message": "Fingerprint does not match"
            })));
        }
    }

    let outcome = register_attendance(pool.get_ref(), profile.id, &profile.employee_number)
        .await
        .map_err(|e| internal_error(e, "Failed to register attendance"))?;

    Ok(HttpResponse::Ok().json(outcome))
}

/* =========================
Face
========================= */
#[utoipa::path(
    post,
    path = "/auth/enroll-face",
    request_body = FaceEnrollment,
    responses(
        (status = 201, description = "Employee enrolled", body = crate::model::employee::Employee),
        (status = 400, description = "Invalid image or no face"),
        (status = 401, description = "Invalid Firebase token"),
        (status = 409, description = "Duplicate employee number or email")
    ),
    tag = "Biometrics"
)]
#[instrument(name = "face_enroll", skip_all, fields(employee_number = %payload.employee_number))]
pub async fn enroll_face(
    pool: web::Data<MySqlPool>,
    verifier: web::Data<dyn IdentityVerifier>,
    embedder: web::Data<dyn FaceEmbedder>,
    vision: Option<web::Data<VisionClient>>,
    payload: web::Json<FaceEnrollment>,
) -> actix_web::Result<impl Responder> {
    let identity = verifier.verify(&payload.firebase_token).await?;

    if let Some(vision) = vision {
        let image = decode_base64_image(&payload.image_base64)?;
        vision.detect_face(&image).await?;
    }

    let face_template = generate_template(embedder.get_ref(), &payload.image_base64).await?;

    let payload = payload.into_inner();
    let new = NewEmployee {
        employee_number: payload.employee_number.trim().to_string(),
        full_name: payload.full_name.trim().to_string(),
        email: payload.email.trim().to_string(),
        firebase_uid: Some(identity.sub),
        face_template: Some(face_template),
        ..Default::default()
    };

    match insert_employee(pool.get_ref(), new).await {
        Ok(employee) => {
            info!(employee_id = employee.id, "Face enrolled");
            Ok(HttpResponse::Created().json(employee))
        }
        Err(e) if is_duplicate(&e) => Ok(conflict()),
        Err(e) => Err(internal_error(e, "Failed to enroll face")),
    }
}

#[utoipa::path(
    post,
    path = "/vision/face-check",
    request_body = FaceCheck,
    responses(
        (status = 200, description = "Face verified, attendance toggled", body = FaceCheckResponse),
        (status = 400, description = "Invalid image or no stored template"),
        (status = 401, description = "Invalid Firebase token"),
        (status = 403, description = "Face does not match", body = Object, example = json!({
            "verified": false,
            "message": "Face does not match the registered employee"
        })),
        (status = 404, description = "No employee for this account")
    ),
    tag = "Biometrics"
)]
#[instrument(name = "face_check", skip_all)]
pub async fn face_check(
    pool: web::Data<MySqlPool>,
    verifier: web::Data<dyn IdentityVerifier>,
    embedder: web::Data<dyn FaceEmbedder>,
    payload: web::Json<FaceCheck>,
) -> actix_web::Result<impl Responder> {
    let identity = verifier.verify(&payload.firebase_token).await?;
    let email = identity.require_email()?;

    let profile = profile_by(pool.get_ref(), "email", email)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch employee"))?;

    let Some(profile) = profile else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No employee is registered with this account"
        })));
    };

    let verified = verify_face(
        embedder.get_ref(),
        &payload.image_base64,
        profile.face_template.as_deref(),
    )
    .await?;

    if !verified {
        info!(employee_id = profile.id, "Face mismatch");
        return Ok(HttpResponse::Forbidden().json(json!({
            "verified": false,
            "message": "Face does not match the registered employee"
        })));
    }

    let outcome = register_attendance(pool.get_ref(), profile.id, &profile.employee_number)
        .await
        .map_err(|e| internal_error(e, "Failed to register attendance"))?;

    Ok(HttpResponse::Ok().json(FaceCheckResponse::from(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_email_uses_employee_number() {
        assert_eq!(fallback_email(" EMP-7 "), "EMP-7@example.com");
    }
}
