use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::storage::FileStorage;

#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub category: String,
    pub live_url: Option<String>,
    pub repo_url: Option<String>,
    pub featured: bool,
    pub sort_order: i32,
    pub image_key: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub category: String,
    pub live_url: Option<String>,
    pub repo_url: Option<String>,
    pub featured: bool,
    pub sort_order: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectView {
    pub fn from_row(row: ProjectRow, storage: &dyn FileStorage) -> Self {
        Self {
            image_url: row.image_key.as_deref().and_then(|k| storage.url_for(k)),
            id: row.id,
            title: row.title,
            description: row.description,
            technologies: row.technologies,
            category: row.category,
            live_url: row.live_url,
            repo_url: row.repo_url,
            featured: row.featured,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
