use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use async_trait::async_trait;
use derive_more::Display;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Google rotates these keys every few hours.
const KEY_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseClaims {
    /// Firebase uid
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Display)]
pub enum AuthError {
    #[display(fmt = "Invalid Firebase token")]
    InvalidToken,

    #[display(fmt = "Expired Firebase token, please sign in again")]
    ExpiredToken,

    #[display(fmt = "Firebase token does not carry an email")]
    MissingEmail,

    #[display(fmt = "Could not verify the Firebase token: {}", _0)]
    KeyFetch(String),
}

impl std::error::Error for AuthError {}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidToken | AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthError::MissingEmail => StatusCode::FORBIDDEN,
            AuthError::KeyFetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

impl FirebaseClaims {
    pub fn require_email(&self) -> Result<&str, AuthError> {
        self.email.as_deref().ok_or(AuthError::MissingEmail)
    }
}

/// Verifies ID tokens issued by the federated identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<FirebaseClaims, AuthError>;
}

/// RS256 verification against Firebase's published signing keys.
pub struct FirebaseVerifier {
    project_id: String,
    http: Client,
    keys: Cache<String, DecodingKey>,
}

impl FirebaseVerifier {
    pub fn new(project_id: String, http: Client) -> Self {
        Self {
            project_id,
            http,
            keys: Cache::builder()
                .max_capacity(32)
                .time_to_live(KEY_TTL)
                .build(),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        let set = self
            .http
            .get(FIREBASE_JWKS_URL)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!(error = %e, "Failed to fetch Firebase signing keys");
                AuthError::KeyFetch(e.to_string())
            })?
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        let mut loaded = 0usize;
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    self.keys.insert(kid, key).await;
                    loaded += 1;
                }
                Err(e) => debug!(error = %e, %kid, "Skipping unusable signing key"),
            }
        }

        info!(loaded, "Firebase signing keys refreshed");
        Ok(())
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.keys.get(kid).await {
            return Ok(key);
        }
        // unknown kid: keys may have rotated, refetch once
        self.refresh_keys().await?;
        self.keys.get(kid).await.ok_or(AuthError::InvalidToken)
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<FirebaseClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        let kid = header.kid.ok_or(AuthError::InvalidToken)?;
        let key = self.key_for(&kid).await?;

        decode::<FirebaseClaims>(token, &key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => {
                    debug!(error = %e, "Firebase token rejected");
                    AuthError::InvalidToken
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_http_statuses() {
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::MissingEmail.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::KeyFetch("timeout".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn claims_without_email_are_refused() {
        let claims: FirebaseClaims = serde_json::from_value(json!({ "sub": "uid-1" })).unwrap();
        assert!(matches!(claims.require_email(), Err(AuthError::MissingEmail)));

        let claims: FirebaseClaims =
            serde_json::from_value(json!({ "sub": "uid-1", "email": "a@b.com" })).unwrap();
        assert_eq!(claims.require_email().unwrap(), "a@b.com");
    }

    #[actix_web::test]
    async fn malformed_token_is_rejected_before_key_lookup() {
        let verifier = FirebaseVerifier::new("demo-project".into(), Client::new());
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(AuthError::InvalidToken)
        ));
    }
}
