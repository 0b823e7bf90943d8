use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::storage::FileStorage;

#[derive(Debug, Clone, FromRow)]
pub struct CvRow {
    pub id: Uuid,
    pub file_key: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CvView {
    pub id: Uuid,
    pub url: Option<String>,
    pub download_url: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

impl CvView {
    pub fn from_row(row: CvRow, storage: &dyn FileStorage) -> Self {
        Self {
            id: row.id,
            url: storage.url_for(&row.file_key),
            download_url: "/api/cv/download".to_string(),
            original_name: row.original_name,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            uploaded_by: row.uploaded_by,
            uploaded_at: row.created_at,
        }
    }
}
