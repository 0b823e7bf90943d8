use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub message: String,
    pub rating: i16,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}
