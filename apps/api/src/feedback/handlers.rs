use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthAdmin;
use crate::errors::AppError;
use crate::feedback::store;
use crate::models::feedback::FeedbackRow;
use crate::state::AppState;
use crate::validation::{self, MAX_BODY_LEN, MAX_NAME_LEN};

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub message: String,
    pub rating: i16,
}

/// Feedback as shown on the public page.
#[derive(Debug, Serialize)]
pub struct PublicFeedback {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub message: String,
    pub rating: i16,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<FeedbackRow> for PublicFeedback {
    fn from(row: FeedbackRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            role: row.role,
            message: row.message,
            rating: row.rating,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApprovalToggle {
    pub approved: bool,
}

/// POST /api/feedback
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<PublicFeedback>), AppError> {
    let name = validation::required_text("name", &req.name, MAX_NAME_LEN)?;
    let role = validation::bounded_text("role", &req.role, MAX_NAME_LEN)?;
    let message = validation::required_text("message", &req.message, MAX_BODY_LEN)?;
    let rating = validation::rating(req.rating)?;

    let row = store::insert(&state.db, &name, &role, &message, rating).await?;
    info!("Feedback {} submitted (rating {})", row.id, row.rating);
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// GET /api/feedback
///
/// Approved entries only.
pub async fn handle_list_public_feedback(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicFeedback>>, AppError> {
    let rows = store::list(&state.db, true).await?;
    Ok(Json(rows.into_iter().map(PublicFeedback::from).collect()))
}

/// GET /api/admin/feedback
///
/// Everything, including pending entries.
pub async fn handle_list_all_feedback(
    State(state): State<AppState>,
) -> Result<Json<Vec<FeedbackRow>>, AppError> {
    Ok(Json(store::list(&state.db, false).await?))
}

/// PATCH /api/feedback/:id/approve
pub async fn handle_set_approval(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApprovalToggle>,
) -> Result<Json<FeedbackRow>, AppError> {
    let row = store::set_approved(&state.db, id, req.approved)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Feedback {id} not found")))?;
    info!(
        "Feedback {id} {} by admin {}",
        if row.approved { "approved" } else { "hidden" },
        admin.id
    );
    Ok(Json(row))
}

/// DELETE /api/feedback/:id
pub async fn handle_delete_feedback(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Feedback {id} not found")));
    }
    info!("Feedback {id} deleted by admin {}", admin.id);
    Ok(StatusCode::NO_CONTENT)
}
