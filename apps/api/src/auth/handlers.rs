use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_against_dummy, verify_password};
use crate::auth::{store, AuthAdmin};
use crate::errors::AppError;
use crate::models::admin::AdminProfile;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub admin: AdminProfile,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".to_string())
}

/// POST /api/auth/login
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }
    let email = req.email.trim().to_lowercase();

    let Some(admin) = store::find_by_email(&state.db, &email).await? else {
        verify_against_dummy(&req.password).await?;
        warn!("Login attempt for unknown admin {email}");
        return Err(invalid_credentials());
    };

    if !verify_password(&req.password, &admin.password_hash).await? {
        warn!("Failed login for admin {}", admin.id);
        return Err(invalid_credentials());
    }

    let token = state
        .jwt
        .issue(admin.id, &admin.email)
        .map_err(|e| AppError::Internal(e.into()))?;
    store::touch_last_login(&state.db, admin.id).await?;
    info!("Admin {} logged in", admin.id);

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.expires_in(),
        admin: AdminProfile::from(admin),
    }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
) -> Result<Json<AdminProfile>, AppError> {
    let admin = store::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Admin {} not found", auth.id)))?;
    Ok(Json(admin.into()))
}

/// PUT /api/auth/password
pub async fn handle_change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    validation::password(&req.new_password)?;

    let admin = store::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Admin {} not found", auth.id)))?;

    if !verify_password(&req.current_password, &admin.password_hash).await? {
        return Err(AppError::Forbidden(
            "Current password is incorrect".to_string(),
        ));
    }

    let hash = hash_password(&req.new_password).await?;
    store::update_password_hash(&state.db, admin.id, &hash).await?;
    info!("Admin {} changed password", admin.id);
    Ok(StatusCode::NO_CONTENT)
}
