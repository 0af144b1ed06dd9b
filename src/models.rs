use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SessionReq {
    /// ID token issued by Firebase Authentication
    pub firebase_token: String,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 28800)]
    pub expires_in: usize,
}

#[derive(FromRow)]
pub struct SessionUserSql {
    pub id: u64,        // 👈 matches BIGINT UNSIGNED,
    pub email: String,
    pub role: Option<String>,
}

/// Claims of the session token issued by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// employee email
    pub sub: String,
    pub employee_id: u64,
    pub role: Option<String>,
    pub exp: usize,
    pub jti: String,
}
