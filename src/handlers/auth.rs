// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        student::Student,
        user::{LoginRequest, RegisterRequest, Role, TokenResponse, User},
    },
    store::Store,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

/// Registers a new account.
///
/// Hashes the password using Argon2 before storing it. A student account is
/// also enrolled on the roster under the same email unless it already is.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(store): State<Arc<dyn Store>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if store.find_user_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let now = Utc::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email: payload.email,
        name: payload.name,
        role: payload.role,
        password_hash: hash_password(&payload.password)?,
        created_at: now,
        updated_at: now,
    };
    let user = store.create_user(user).await?;

    if user.role == Role::Student {
        enrol(store.as_ref(), &user).await?;
    }

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn enrol(store: &dyn Store, user: &User) -> Result<(), AppError> {
    if store.find_student_by_email(&user.email).await?.is_some() {
        return Ok(());
    }

    let school_id = format!("STU-{}", &user.id[..8].to_uppercase());
    let student = Student::new(user.name.clone(), user.email.clone(), school_id, None);
    match store.create_student(student).await {
        // Enrolled concurrently by an admin.
        Ok(_) | Err(AppError::Conflict(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Authenticates a user and returns a bearer token.
pub async fn login(
    State(store): State<Arc<dyn Store>>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rejected = || AppError::AuthError("Incorrect email or password".to_string());

    payload.validate().map_err(|_| rejected())?;

    let user = store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or_else(rejected)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(rejected());
    }

    let access_token = sign_jwt(
        &user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// The account behind the presented token.
pub async fn me(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user(&claims.sub)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> impl IntoResponse {
    Json(json!({ "message": "Successfully logged out" }))
}
