use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthAdmin;
use crate::errors::AppError;
use crate::messages::store;
use crate::models::message::MessageRow;
use crate::state::AppState;
use crate::validation::{self, MAX_BODY_LEN, MAX_NAME_LEN, MAX_SUBJECT_LEN};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub struct ValidContact {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReadToggle {
    pub is_read: bool,
}

/// POST /api/messages (public contact form)
pub async fn handle_submit_message(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<(StatusCode, Json<MessageRow>), AppError> {
    let contact = validate_contact(&req)?;
    let row = store::insert(
        &state.db,
        &contact.name,
        &contact.email,
        &contact.subject,
        &contact.body,
    )
    .await?;
    info!("Contact message {} received", row.id);
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    Query(params): Query<MessageListQuery>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    Ok(Json(store::list(&state.db, params.unread).await?))
}

/// PATCH /api/messages/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReadToggle>,
) -> Result<Json<MessageRow>, AppError> {
    let row = store::set_read(&state.db, id, req.is_read)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message {id} not found")))?;
    Ok(Json(row))
}

/// DELETE /api/messages/:id
pub async fn handle_delete_message(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Message {id} not found")));
    }
    info!("Message {id} deleted by admin {}", admin.id);
    Ok(StatusCode::NO_CONTENT)
}

pub fn validate_contact(req: &ContactRequest) -> Result<ValidContact, AppError> {
    Ok(ValidContact {
        name: validation::required_text("name", &req.name, MAX_NAME_LEN)?,
        email: validation::email(&req.email)?,
        subject: validation::bounded_text("subject", &req.subject, MAX_SUBJECT_LEN)?,
        body: validation::required_text("message", &req.message, MAX_BODY_LEN)?,
    })
}
