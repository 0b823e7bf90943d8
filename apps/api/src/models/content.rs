use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::storage::FileStorage;

#[derive(Debug, Clone, FromRow)]
pub struct HeroRow {
    pub greeting: String,
    pub name: String,
    pub roles: Vec<String>,
    pub description: String,
    pub image_key: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HeroView {
    pub greeting: String,
    pub name: String,
    pub roles: Vec<String>,
    pub description: String,
    pub image_url: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl HeroView {
    pub fn from_row(row: HeroRow, storage: &dyn FileStorage) -> Self {
        Self {
            image_url: row.image_key.as_deref().and_then(|k| storage.url_for(k)),
            greeting: row.greeting,
            name: row.name,
            roles: row.roles,
            description: row.description,
            uploaded_by: row.uploaded_by,
            updated_at: Some(row.updated_at),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AboutRow {
    pub heading: String,
    pub bio: String,
    pub years_experience: i32,
    pub projects_completed: i32,
    pub image_key: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AboutView {
    pub heading: String,
    pub bio: String,
    pub years_experience: i32,
    pub projects_completed: i32,
    pub image_url: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AboutView {
    pub fn from_row(row: AboutRow, storage: &dyn FileStorage) -> Self {
        Self {
            image_url: row.image_key.as_deref().and_then(|k| storage.url_for(k)),
            heading: row.heading,
            bio: row.bio,
            years_experience: row.years_experience,
            projects_completed: row.projects_completed,
            uploaded_by: row.uploaded_by,
            updated_at: Some(row.updated_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Icon identifier understood by the frontend (e.g. `code`, `server`).
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServicesRow {
    pub heading: String,
    pub intro: String,
    pub items: Json<Vec<ServiceItem>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServicesView {
    pub heading: String,
    pub intro: String,
    pub items: Vec<ServiceItem>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ServicesRow> for ServicesView {
    fn from(row: ServicesRow) -> Self {
        Self {
            heading: row.heading,
            intro: row.intro,
            items: row.items.0,
            updated_at: Some(row.updated_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationItem {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field: String,
    pub start_year: i32,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EducationRow {
    pub heading: String,
    pub items: Json<Vec<EducationItem>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EducationView {
    pub heading: String,
    pub items: Vec<EducationItem>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<EducationRow> for EducationView {
    fn from(row: EducationRow) -> Self {
        Self {
            heading: row.heading,
            items: row.items.0,
            updated_at: Some(row.updated_at),
        }
    }
}
