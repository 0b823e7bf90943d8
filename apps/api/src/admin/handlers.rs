use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::auth::{store as admins, AuthAdmin};
use crate::errors::AppError;
use crate::models::admin::AdminProfile;
use crate::state::AppState;
use crate::validation::{self, MAX_NAME_LEN};
use crate::{cv, feedback, messages, projects};

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub projects: i64,
    pub messages: i64,
    pub unread_messages: i64,
    pub feedback: i64,
    pub pending_feedback: i64,
    pub has_cv: bool,
}

/// GET /api/admin/users
pub async fn handle_list_admins(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminProfile>>, AppError> {
    let rows = admins::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(AdminProfile::from).collect()))
}

/// POST /api/admin/users
pub async fn handle_create_admin(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthAdmin>,
    Json(req): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminProfile>), AppError> {
    let email = validation::email(&req.email)?;
    let name = validation::bounded_text("name", &req.name, MAX_NAME_LEN)?;
    validation::password(&req.password)?;

    let hash = hash_password(&req.password).await?;
    let row = admins::create(&state.db, &email, &name, &hash).await?;
    info!("Admin {} created by admin {}", row.id, actor.id);
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// DELETE /api/admin/users/:id
pub async fn handle_delete_admin(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthAdmin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if id == actor.id {
        return Err(AppError::Forbidden(
            "Admins cannot delete their own account".to_string(),
        ));
    }
    if !admins::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Admin {id} not found")));
    }
    info!("Admin {id} deleted by admin {}", actor.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let projects = projects::store::count(&state.db).await?;
    let (messages, unread_messages) = messages::store::counts(&state.db).await?;
    let (feedback, pending_feedback) = feedback::store::counts(&state.db).await?;
    let has_cv = cv::store::exists(&state.db).await?;

    Ok(Json(DashboardStats {
        projects,
        messages,
        unread_messages,
        feedback,
        pending_feedback,
        has_cv,
    }))
}
