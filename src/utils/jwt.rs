// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::user::Role};

/// Things a caller may be allowed to do. Every role check goes through here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Roster, quizzes, results, every video, notifications, dashboards.
    ManageClass,
    /// Submit quizzes and videos as oneself.
    TakeQuizzes,
}

impl Role {
    pub fn can(self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::Admin, Capability::ManageClass) => true,
            (Role::Student, Capability::TakeQuizzes) => true,
            _ => false,
        }
    }
}

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID.
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not enough permissions".to_string()))
        }
    }

    /// Admins pass; anyone else only when `owner_email` is their own.
    pub fn require_self_or_admin(&self, owner_email: &str) -> Result<(), AppError> {
        if self.role.can(Capability::ManageClass) || self.email == owner_email {
            Ok(())
        } else {
            Err(AppError::Forbidden("Access denied".to_string()))
        }
    }
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    id: &str,
    email: &str,
    role: Role,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_owned(),
        email: email.to_owned(),
        role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Could not validate credentials".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects `Claims`
/// into the request extensions. Returns 401 otherwise.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(AppError::AuthError("Not authenticated".to_string())),
    };

    let claims = verify_jwt(token, &config.jwt_secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))?;

    claims.require(Capability::ManageClass)?;

    Ok(next.run(req).await)
}

/// Rejects callers without the student capability. Layered like `admin_middleware`.
pub async fn student_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(AppError::AuthError("Not authenticated".to_string()))?;

    if !claims.role.can(Capability::TakeQuizzes) {
        return Err(AppError::Forbidden(
            "Only students can access this resource".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_capabilities() {
        assert!(Role::Admin.can(Capability::ManageClass));
        assert!(!Role::Admin.can(Capability::TakeQuizzes));
        assert!(Role::Student.can(Capability::TakeQuizzes));
        assert!(!Role::Student.can(Capability::ManageClass));
    }

    #[test]
    fn token_round_trips_claims() {
        let token = sign_jwt("u1", "ana@example.com", Role::Student, "secret", 60).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, Role::Student);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_jwt("u1", "ana@example.com", Role::Admin, "secret", 60).unwrap();
        assert!(matches!(
            verify_jwt(&token, "other"),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn self_or_admin() {
        let student = Claims {
            sub: "u1".into(),
            email: "ana@example.com".into(),
            role: Role::Student,
            exp: 0,
        };
        assert!(student.require_self_or_admin("ana@example.com").is_ok());
        assert!(matches!(
            student.require_self_or_admin("bo@example.com"),
            Err(AppError::Forbidden(_))
        ));
        assert!(student.require(Capability::ManageClass).is_err());

        let admin = Claims {
            role: Role::Admin,
            ..student
        };
        assert!(admin.require_self_or_admin("bo@example.com").is_ok());
    }
}
