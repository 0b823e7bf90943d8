use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthAdmin;
use crate::content::store::{self, AboutWrite, HeroWrite};
use crate::errors::AppError;
use crate::models::content::{
    AboutRow, AboutView, EducationItem, EducationView, HeroRow, HeroView, ServiceItem,
    ServicesView,
};
use crate::state::AppState;
use crate::storage::FileStorage;
use crate::uploads::{MultipartForm, PendingFile, UploadKind};
use crate::validation::{bounded_text, required_text, MAX_BODY_LEN, MAX_NAME_LEN, MAX_SUBJECT_LEN};

const MAX_ITEMS: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Hero
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/hero
pub async fn handle_get_hero(State(state): State<AppState>) -> Result<Json<HeroView>, AppError> {
    let hero = store::get_hero(&state.db).await?;
    Ok(Json(
        hero.map(|row| HeroView::from_row(row, state.storage.as_ref()))
            .unwrap_or_default(),
    ))
}

/// PUT /api/hero (multipart: greeting, name, roles, description, image, remove_image)
///
/// Fields left out of the form keep their current value.
pub async fn handle_update_hero(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    multipart: Multipart,
) -> Result<Json<HeroView>, AppError> {
    let form = MultipartForm::read(multipart, "image", UploadKind::Image).await?;
    let row = update_hero(&state.db, state.storage.as_ref(), &form, admin.id).await?;
    info!("Hero content updated by admin {}", admin.id);
    Ok(Json(HeroView::from_row(row, state.storage.as_ref())))
}

pub async fn update_hero(
    db: &PgPool,
    storage: &dyn FileStorage,
    form: &MultipartForm,
    admin_id: Uuid,
) -> Result<HeroRow, AppError> {
    let mut pending = PendingFile::stage(storage, form.file.as_ref(), UploadKind::Image).await?;
    let written = write_hero(db, form, admin_id, &mut pending).await;
    pending.settle(storage, written).await
}

/// Merges the form over the stored hero and writes it under the table lock.
async fn write_hero(
    db: &PgPool,
    form: &MultipartForm,
    admin_id: Uuid,
    pending: &mut PendingFile,
) -> Result<HeroRow, AppError> {
    let mut tx = db.begin().await?;
    let current = store::lock_hero(&mut *tx).await?;

    let greeting = field_or(form, "greeting", MAX_SUBJECT_LEN, current.as_ref().map(|h| h.greeting.as_str()))?;
    let name = field_or(form, "name", MAX_NAME_LEN, current.as_ref().map(|h| h.name.as_str()))?;
    let description = field_or(form, "description", MAX_BODY_LEN, current.as_ref().map(|h| h.description.as_str()))?;
    let roles = match form.list("roles")? {
        Some(roles) => roles
            .iter()
            .map(|r| required_text("roles", r, MAX_NAME_LEN))
            .collect::<Result<Vec<_>, _>>()?,
        None => current.as_ref().map(|h| h.roles.clone()).unwrap_or_default(),
    };

    let remove = form.flag("remove_image")?.unwrap_or(false);
    let image_key = pending.resolve(current.and_then(|h| h.image_key), remove);

    let row = store::upsert_hero(
        &mut *tx,
        HeroWrite {
            greeting: &greeting,
            name: &name,
            roles: &roles,
            description: &description,
            image_key: image_key.as_deref(),
            uploaded_by: Some(admin_id),
        },
    )
    .await?;
    tx.commit().await?;
    Ok(row)
}

// ────────────────────────────────────────────────────────────────────────────
// About
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/about
pub async fn handle_get_about(State(state): State<AppState>) -> Result<Json<AboutView>, AppError> {
    let about = store::get_about(&state.db).await?;
    Ok(Json(
        about
            .map(|row| AboutView::from_row(row, state.storage.as_ref()))
            .unwrap_or_default(),
    ))
}

/// PUT /api/about (multipart: heading, bio, years_experience, projects_completed, image, remove_image)
pub async fn handle_update_about(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    multipart: Multipart,
) -> Result<Json<AboutView>, AppError> {
    let form = MultipartForm::read(multipart, "image", UploadKind::Image).await?;
    let mut pending =
        PendingFile::stage(state.storage.as_ref(), form.file.as_ref(), UploadKind::Image).await?;
    let written = write_about(&state.db, &form, admin.id, &mut pending).await;
    let row = pending.settle(state.storage.as_ref(), written).await?;

    info!("About content updated by admin {}", admin.id);
    Ok(Json(AboutView::from_row(row, state.storage.as_ref())))
}

async fn write_about(
    db: &PgPool,
    form: &MultipartForm,
    admin_id: Uuid,
    pending: &mut PendingFile,
) -> Result<AboutRow, AppError> {
    let mut tx = db.begin().await?;
    let current = store::lock_about(&mut *tx).await?;

    let heading = field_or(form, "heading", MAX_SUBJECT_LEN, current.as_ref().map(|a| a.heading.as_str()))?;
    let bio = field_or(form, "bio", MAX_BODY_LEN, current.as_ref().map(|a| a.bio.as_str()))?;
    let years_experience = non_negative(
        "years_experience",
        form.integer("years_experience")?,
        current.as_ref().map(|a| a.years_experience),
    )?;
    let projects_completed = non_negative(
        "projects_completed",
        form.integer("projects_completed")?,
        current.as_ref().map(|a| a.projects_completed),
    )?;

    let remove = form.flag("remove_image")?.unwrap_or(false);
    let image_key = pending.resolve(current.and_then(|a| a.image_key), remove);

    let row = store::upsert_about(
        &mut *tx,
        AboutWrite {
            heading: &heading,
            bio: &bio,
            years_experience,
            projects_completed,
            image_key: image_key.as_deref(),
            uploaded_by: Some(admin_id),
        },
    )
    .await?;
    tx.commit().await?;
    Ok(row)
}

// ────────────────────────────────────────────────────────────────────────────
// Services
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ServicesUpdate {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub intro: String,
    pub items: Vec<ServiceItem>,
}

/// GET /api/services
pub async fn handle_get_services(
    State(state): State<AppState>,
) -> Result<Json<ServicesView>, AppError> {
    let services = store::get_services(&state.db).await?;
    Ok(Json(services.map(ServicesView::from).unwrap_or_default()))
}

/// PUT /api/services
///
/// Replaces the whole item list.
pub async fn handle_update_services(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Json(req): Json<ServicesUpdate>,
) -> Result<Json<ServicesView>, AppError> {
    let update = validate_services(req)?;
    let row = store::upsert_services(&state.db, &update.heading, &update.intro, &update.items).await?;
    info!(
        "Services updated by admin {} ({} items)",
        admin.id,
        update.items.len()
    );
    Ok(Json(row.into()))
}

pub fn validate_services(req: ServicesUpdate) -> Result<ServicesUpdate, AppError> {
    if req.items.len() > MAX_ITEMS {
        return Err(AppError::Validation(format!(
            "at most {MAX_ITEMS} services are allowed"
        )));
    }
    let items = req
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Ok(ServiceItem {
                title: required_text(&format!("items[{i}].title"), &item.title, MAX_SUBJECT_LEN)?,
                description: bounded_text(&format!("items[{i}].description"), &item.description, MAX_BODY_LEN)?,
                icon: bounded_text(&format!("items[{i}].icon"), &item.icon, MAX_NAME_LEN)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(ServicesUpdate {
        heading: bounded_text("heading", &req.heading, MAX_SUBJECT_LEN)?,
        intro: bounded_text("intro", &req.intro, MAX_BODY_LEN)?,
        items,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EducationUpdate {
    #[serde(default)]
    pub heading: String,
    pub items: Vec<EducationItem>,
}

/// GET /api/education
pub async fn handle_get_education(
    State(state): State<AppState>,
) -> Result<Json<EducationView>, AppError> {
    let education = store::get_education(&state.db).await?;
    Ok(Json(education.map(EducationView::from).unwrap_or_default()))
}

/// PUT /api/education
///
/// Replaces the whole item list.
pub async fn handle_update_education(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Json(req): Json<EducationUpdate>,
) -> Result<Json<EducationView>, AppError> {
    let update = validate_education(req)?;
    let row = store::upsert_education(&state.db, &update.heading, &update.items).await?;
    info!(
        "Education updated by admin {} ({} items)",
        admin.id,
        update.items.len()
    );
    Ok(Json(row.into()))
}

pub fn validate_education(req: EducationUpdate) -> Result<EducationUpdate, AppError> {
    if req.items.len() > MAX_ITEMS {
        return Err(AppError::Validation(format!(
            "at most {MAX_ITEMS} education entries are allowed"
        )));
    }
    let items = req
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if let Some(end) = item.end_year {
                if end < item.start_year {
                    return Err(AppError::Validation(format!(
                        "items[{i}].end_year must not be before start_year"
                    )));
                }
            }
            Ok(EducationItem {
                institution: required_text(&format!("items[{i}].institution"), &item.institution, MAX_SUBJECT_LEN)?,
                degree: required_text(&format!("items[{i}].degree"), &item.degree, MAX_SUBJECT_LEN)?,
                field: bounded_text(&format!("items[{i}].field"), &item.field, MAX_SUBJECT_LEN)?,
                start_year: item.start_year,
                end_year: item.end_year,
                description: bounded_text(&format!("items[{i}].description"), &item.description, MAX_BODY_LEN)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(EducationUpdate {
        heading: bounded_text("heading", &req.heading, MAX_SUBJECT_LEN)?,
        items,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Form value when present, otherwise the stored value (or empty).
fn field_or(
    form: &MultipartForm,
    name: &str,
    max: usize,
    current: Option<&str>,
) -> Result<String, AppError> {
    match form.text(name) {
        Some(value) => bounded_text(name, &value, max),
        None => Ok(current.unwrap_or_default().to_string()),
    }
}

fn non_negative(name: &str, value: Option<i32>, current: Option<i32>) -> Result<i32, AppError> {
    match value {
        Some(v) if v < 0 => Err(AppError::Validation(format!("{name} must not be negative"))),
        Some(v) => Ok(v),
        None => Ok(current.unwrap_or(0)),
    }
}
