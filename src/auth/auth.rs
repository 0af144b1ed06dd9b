use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::is_admin_role;
use crate::models::Claims;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: u64,
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn from_claims(claims: Claims, config: &Config) -> Self {
        let is_admin = is_admin_role(claims.role.as_deref(), &config.admin_roles);
        AuthUser {
            employee_id: claims.employee_id,
            email: claims.sub,
            is_admin,
        }
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        match verify_token(token, &config.jwt_secret) {
            Ok(claims) => ready(Ok(AuthUser::from_claims(claims, config))),
            Err(_) => ready(Err(ErrorUnauthorized("Invalid token"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// Admins may act on anyone, others only on themselves.
    pub fn require_self_or_admin(&self, employee_id: u64) -> actix_web::Result<()> {
        if self.is_admin || self.employee_id == employee_id {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden(
                "You cannot act on behalf of another employee",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> AuthUser {
        AuthUser {
            employee_id: 5,
            email: "luis@company.com".into(),
            is_admin,
        }
    }

    #[test]
    fn claims_role_decides_admin() {
        let config = crate::config::test_config();
        let claims = |role: Option<&str>| Claims {
            sub: "ana@company.com".into(),
            employee_id: 7,
            role: role.map(String::from),
            exp: 0,
            jti: "j".into(),
        };

        let hr = AuthUser::from_claims(claims(Some("rh")), &config);
        assert!(hr.is_admin);
        assert_eq!(hr.email, "ana@company.com");
        assert_eq!(hr.employee_id, 7);

        assert!(!AuthUser::from_claims(claims(Some("Employee")), &config).is_admin);
        assert!(!AuthUser::from_claims(claims(None), &config).is_admin);
    }

    #[test]
    fn admin_checks() {
        assert!(user(true).require_admin().is_ok());
        assert!(user(false).require_admin().is_err());
    }

    #[test]
    fn self_checks() {
        assert!(user(false).require_self_or_admin(5).is_ok());
        assert!(user(false).require_self_or_admin(6).is_err());
        assert!(user(true).require_self_or_admin(6).is_ok());
    }
}
