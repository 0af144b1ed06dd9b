use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub session_ttl: usize,

    // Rate limiting
    pub rate_auth_per_min: u32,
    pub rate_kiosk_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub firebase_project_id: String,
    /// Role names allowed to manage other employees' data
    pub admin_roles: Vec<String>,

    // Google Drive / Sheets export
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_refresh_token: String,
    pub google_access_token: Option<String>,
    pub drive_folder_id: Option<String>,

    pub face_embedding_url: String,
    pub vision_api_key: Option<String>,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

pub fn parse_role_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            session_ttl: parsed("SESSION_TTL", 28_800)?, // default 8 h

            rate_auth_per_min: parsed("RATE_AUTH_PER_MIN", 60)?,
            rate_kiosk_per_min: parsed("RATE_KIOSK_PER_MIN", 120)?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            firebase_project_id: required("FIREBASE_PROJECT_ID")?,
            admin_roles: parse_role_list(
                &env::var("ADMIN_ROLES").unwrap_or_else(|_| "Admin,RH".to_string()),
            ),

            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            google_refresh_token: env::var("GOOGLE_REFRESH_TOKEN").unwrap_or_default(),
            google_access_token: optional("GOOGLE_ACCESS_TOKEN"),
            drive_folder_id: optional("DRIVE_FOLDER_ID"),

            face_embedding_url: env::var("FACE_EMBEDDING_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5005/represent".to_string()),
            vision_api_key: optional("VISION_API_KEY"),
        })
    }
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        database_url: "mysql://localhost/timeclock".into(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        session_ttl: 600,
        rate_auth_per_min: 60,
        rate_kiosk_per_min: 120,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        firebase_project_id: "demo-project".into(),
        admin_roles: parse_role_list("Admin,RH"),
        google_client_id: String::new(),
        google_client_secret: String::new(),
        google_refresh_token: String::new(),
        google_access_token: None,
        drive_folder_id: None,
        face_embedding_url: "http://127.0.0.1:5005/represent".into(),
        vision_api_key: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_list_skips_blanks() {
        assert_eq!(parse_role_list("Admin, RH ,,"), vec!["Admin", "RH"]);
        assert!(parse_role_list("").is_empty());
    }
}
