use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Role {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Admin")]
    pub name: String,
}

/// Role names are compared case-insensitively against the configured admin roles.
pub fn is_admin_role(role: Option<&str>, admin_roles: &[String]) -> bool {
    match role {
        Some(name) => admin_roles
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(name.trim())),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_match_ignores_case() {
        let admins = vec!["Admin".to_string(), "RH".to_string()];
        assert!(is_admin_role(Some("admin"), &admins));
        assert!(is_admin_role(Some(" rh "), &admins));
        assert!(!is_admin_role(Some("Employee"), &admins));
        assert!(!is_admin_role(None, &admins));
    }
}
