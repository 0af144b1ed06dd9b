use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::ExportError;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this window are refreshed before use.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Source of bearer tokens for the spreadsheet APIs.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, ExportError>;
}

/// Always hands out the same token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, ExportError> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(EXPIRY_BUFFER_SECS) < self.expires_at
    }
}

/// Exchanges a long-lived OAuth refresh token for access tokens, caching
/// each one until shortly before it expires.
pub struct OAuthRefreshProvider {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    http: Client,
    token: Mutex<Option<CachedToken>>,
}

impl OAuthRefreshProvider {
    pub fn new(client_id: String, client_secret: String, refresh_token: String, http: Client) -> Self {
        Self {
            client_id,
            client_secret,
            refresh_token,
            http,
            token: Mutex::new(None),
        }
    }

    async fn refresh(&self) -> Result<CachedToken, ExportError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http.post(GOOGLE_TOKEN_URL).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = status.as_u16(), %message, "Google token refresh failed");
            return Err(ExportError::Token(message));
        }

        let body = response.json::<TokenResponse>().await?;
        info!(expires_in = body.expires_in, "Google access token refreshed");

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at: Utc::now() + TimeDelta::seconds(body.expires_in),
        })
    }
}

#[async_trait]
impl CredentialProvider for OAuthRefreshProvider {
    async fn access_token(&self) -> Result<String, ExportError> {
        // held across the refresh so concurrent exports share one exchange
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            debug!("Using cached Google access token");
            return Ok(cached.access_token.clone());
        }

        let fresh = self.refresh().await?;
        let token = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_inside_buffer_is_stale() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "t".into(),
            expires_at: now + TimeDelta::seconds(EXPIRY_BUFFER_SECS - 1),
        };
        assert!(!token.is_fresh(now));
    }

    #[test]
    fn token_past_buffer_is_fresh() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "t".into(),
            expires_at: now + TimeDelta::seconds(3600),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + TimeDelta::seconds(3600)));
    }

    #[actix_web::test]
    async fn cached_token_is_served_without_refresh() {
        let provider = OAuthRefreshProvider::new(
            "id".into(),
            "secret".into(),
            "refresh".into(),
            Client::new(),
        );
        *provider.token.lock().await = Some(CachedToken {
            access_token: "cached".into(),
            expires_at: Utc::now() + TimeDelta::seconds(3600),
        });
        assert_eq!(provider.access_token().await.unwrap(), "cached");
    }

    #[actix_web::test]
    async fn static_provider_returns_its_token() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }
}
