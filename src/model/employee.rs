use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_number": "EMP-001",
        "full_name": "Ana Torres",
        "email": "ana.torres@company.com",
        "cost_center": "C003",
        "role_id": 2,
        "department_id": 10
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_number: String,

    #[schema(example = "Ana Torres")]
    pub full_name: String,

    #[schema(example = "ana.torres@company.com")]
    pub email: String,

    #[schema(example = "C003", nullable = true)]
    pub cost_center: Option<String>,

    #[schema(example = 2, nullable = true)]
    pub role_id: Option<u64>,

    #[schema(example = 10, nullable = true)]
    pub department_id: Option<u64>,
}

/// Stored biometric templates for one employee.
#[derive(Debug, sqlx::FromRow)]
pub struct BiometricProfile {
    pub id: u64,
    pub employee_number: String,
    /// JSON array of the face embedding
    pub face_template: Option<String>,
    pub fingerprint_template: Option<Vec<u8>>,
}
