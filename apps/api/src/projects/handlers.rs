use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthAdmin;
use crate::errors::AppError;
use crate::models::project::{ProjectRow, ProjectView};
use crate::projects::store::{self, ProjectFilter, ProjectWrite};
use crate::state::AppState;
use crate::storage::{discard, FileStorage};
use crate::uploads::{MultipartForm, PendingFile, UploadKind};
use crate::validation::{
    bounded_text, optional_link, required_text, MAX_BODY_LEN, MAX_NAME_LEN, MAX_SUBJECT_LEN,
};

const MAX_TECHNOLOGIES: usize = 30;

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

/// GET /api/projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
    Query(params): Query<ProjectListQuery>,
) -> Result<Json<Vec<ProjectView>>, AppError> {
    let filter = ProjectFilter {
        category: params
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        featured: params.featured,
    };
    let rows = store::list(&state.db, &filter).await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| ProjectView::from_row(row, state.storage.as_ref()))
            .collect(),
    ))
}

/// GET /api/projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectView>, AppError> {
    let row = store::get(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(ProjectView::from_row(row, state.storage.as_ref())))
}

/// POST /api/projects (multipart)
pub async fn handle_create_project(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProjectView>), AppError> {
    let form = MultipartForm::read(multipart, "image", UploadKind::Image).await?;
    let mut write = project_from_form(&form, None)?;

    let mut pending =
        PendingFile::stage(state.storage.as_ref(), form.file.as_ref(), UploadKind::Image).await?;
    write.image_key = pending.resolve(None, false);
    write.uploaded_by = Some(admin.id);

    let inserted = store::insert(&state.db, &write).await.map_err(AppError::from);
    let row = pending.settle(state.storage.as_ref(), inserted).await?;

    info!("Project {} created by admin {}", row.id, admin.id);
    Ok((
        StatusCode::CREATED,
        Json(ProjectView::from_row(row, state.storage.as_ref())),
    ))
}

/// PUT /api/projects/:id (multipart, partial)
pub async fn handle_update_project(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ProjectView>, AppError> {
    let form = MultipartForm::read(multipart, "image", UploadKind::Image).await?;
    let row = update_project(&state.db, state.storage.as_ref(), id, &form, admin.id).await?;
    info!("Project {id} updated by admin {}", admin.id);
    Ok(Json(ProjectView::from_row(row, state.storage.as_ref())))
}

pub async fn update_project(
    db: &PgPool,
    storage: &dyn FileStorage,
    id: Uuid,
    form: &MultipartForm,
    admin_id: Uuid,
) -> Result<ProjectRow, AppError> {
    let mut pending = PendingFile::stage(storage, form.file.as_ref(), UploadKind::Image).await?;
    let written = write_project(db, id, form, admin_id, &mut pending).await;
    pending.settle(storage, written).await
}

/// Merges the form over the locked row and writes it back.
async fn write_project(
    db: &PgPool,
    id: Uuid,
    form: &MultipartForm,
    admin_id: Uuid,
    pending: &mut PendingFile,
) -> Result<ProjectRow, AppError> {
    let mut tx = db.begin().await?;
    let current = store::lock(&mut *tx, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let mut write = project_from_form(form, Some(&current))?;

    let remove = form.flag("remove_image")?.unwrap_or(false);
    write.image_key = pending.resolve(current.image_key.clone(), remove);
    write.uploaded_by = if pending.is_fresh() {
        Some(admin_id)
    } else {
        current.uploaded_by
    };

    let row = store::update(&mut *tx, id, &write)
        .await?
        .ok_or_else(|| not_found(id))?;
    tx.commit().await?;
    Ok(row)
}

/// DELETE /api/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let image_key = store::delete(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    discard(state.storage.as_ref(), image_key.as_deref()).await;
    info!("Project {id} deleted by admin {}", admin.id);
    Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Project {id} not found"))
}

/// Builds the row values from a form. With `current`, absent fields keep
/// their stored value; without it, `title` and `description` are required.
/// Image columns are filled in by the caller.
fn project_from_form(
    form: &MultipartForm,
    current: Option<&ProjectRow>,
) -> Result<ProjectWrite, AppError> {
    let title = match (form.text("title"), current) {
        (Some(v), _) => required_text("title", &v, MAX_SUBJECT_LEN)?,
        (None, Some(c)) => c.title.clone(),
        (None, None) => form.required("title")?,
    };
    let description = match (form.text("description"), current) {
        (Some(v), _) => required_text("description", &v, MAX_BODY_LEN)?,
        (None, Some(c)) => c.description.clone(),
        (None, None) => form.required("description")?,
    };

    let technologies = match form.list("technologies")? {
        Some(list) => {
            if list.len() > MAX_TECHNOLOGIES {
                return Err(AppError::Validation(format!(
                    "at most {MAX_TECHNOLOGIES} technologies are allowed"
                )));
            }
            list.iter()
                .map(|t| bounded_text("technologies", t, MAX_NAME_LEN))
                .collect::<Result<Vec<_>, _>>()?
        }
        None => current.map(|c| c.technologies.clone()).unwrap_or_default(),
    };

    let category = match form.text("category") {
        Some(v) => bounded_text("category", &v, MAX_NAME_LEN)?,
        None => current.map(|c| c.category.clone()).unwrap_or_default(),
    };

    let live_url = match form.text("live_url") {
        Some(v) => optional_link("live_url", Some(&v))?,
        None => current.and_then(|c| c.live_url.clone()),
    };
    let repo_url = match form.text("repo_url") {
        Some(v) => optional_link("repo_url", Some(&v))?,
        None => current.and_then(|c| c.repo_url.clone()),
    };

    Ok(ProjectWrite {
        title,
        description,
        technologies,
        category,
        live_url,
        repo_url,
        featured: form
            .flag("featured")?
            .or(current.map(|c| c.featured))
            .unwrap_or(false),
        sort_order: form
            .integer("sort_order")?
            .or(current.map(|c| c.sort_order))
            .unwrap_or(0),
        image_key: None,
        uploaded_by: None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use chrono::Utc;

    use super::*;
    use crate::db::testing::{isolated_pool, seed_admin};
    use crate::storage::DiskStorage;
    use crate::uploads::UploadedFile;

    fn existing() -> ProjectRow {
        ProjectRow {
            id: Uuid::new_v4(),
            title: "Old title".to_string(),
            description: "Old description".to_string(),
            technologies: vec!["Rust".to_string()],
            category: "web".to_string(),
            live_url: Some("https://old.dev".to_string()),
            repo_url: None,
            featured: true,
            sort_order: 3,
            image_key: Some("images/old.png".to_string()),
            uploaded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_requires_title() {
        let form = MultipartForm::from_fields(&[("description", "A thing")]);
        let err = project_from_form(&form, None).unwrap_err();
        assert!(err.to_string().contains("title is required"));
    }

    #[test]
    fn test_create_defaults() {
        let form = MultipartForm::from_fields(&[
            ("title", "Portfolio"),
            ("description", "This site"),
            ("technologies", "Rust, Axum"),
        ]);
        let write = project_from_form(&form, None).unwrap();
        assert_eq!(write.technologies, vec!["Rust", "Axum"]);
        assert!(!write.featured);
        assert_eq!(write.sort_order, 0);
        assert!(write.live_url.is_none());
    }

    #[test]
    fn test_partial_update_keeps_existing() {
        let current = existing();
        let form = MultipartForm::from_fields(&[("title", "New title")]);
        let write = project_from_form(&form, Some(&current)).unwrap();
        assert_eq!(write.title, "New title");
        assert_eq!(write.description, "Old description");
        assert_eq!(write.technologies, vec!["Rust"]);
        assert!(write.featured);
        assert_eq!(write.sort_order, 3);
        assert_eq!(write.live_url.as_deref(), Some("https://old.dev"));
    }

    #[test]
    fn test_blank_link_clears_it() {
        let current = existing();
        let form = MultipartForm::from_fields(&[("live_url", "")]);
        let write = project_from_form(&form, Some(&current)).unwrap();
        assert!(write.live_url.is_none());
    }

    #[test]
    fn test_blank_title_on_update_rejected() {
        let current = existing();
        let form = MultipartForm::from_fields(&[("title", "  ")]);
        assert!(project_from_form(&form, Some(&current)).is_err());
    }

    #[test]
    fn test_invalid_link_rejected() {
        let form = MultipartForm::from_fields(&[
            ("title", "T"),
            ("description", "D"),
            ("repo_url", "github.com/me/repo"),
        ]);
        let err = project_from_form(&form, None).unwrap_err();
        assert!(err.to_string().contains("repo_url"));
    }

    fn with_image(fields: &[(&str, &str)]) -> MultipartForm {
        let mut form = MultipartForm::from_fields(fields);
        form.file = Some(UploadedFile {
            original_name: "shot.webp".to_string(),
            content_type: "image/webp".to_string(),
            extension: "webp".to_string(),
            bytes: Bytes::from_static(b"webp"),
        });
        form
    }

    async fn seed_project(pool: &PgPool, image_key: Option<String>) -> ProjectRow {
        let form = MultipartForm::from_fields(&[("title", "Portfolio"), ("description", "This site")]);
        let mut write = project_from_form(&form, None).unwrap();
        write.image_key = image_key;
        store::insert(pool, &write).await.unwrap()
    }

    #[tokio::test]
    async fn test_update_of_missing_project_discards_upload() {
        let Some(pool) = isolated_pool().await else { return };
        let admin = seed_admin(&pool, "ada@example.com").await;
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path(), None);

        let err = update_project(&pool, &storage, Uuid::new_v4(), &with_image(&[]), admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let leftovers = std::fs::read_dir(dir.path().join("images"))
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_text_edit_keeps_uploader_and_image() {
        let Some(pool) = isolated_pool().await else { return };
        let admin = seed_admin(&pool, "ada@example.com").await;
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path(), None);
        let project = seed_project(&pool, None).await;

        let with_file = update_project(&pool, &storage, project.id, &with_image(&[]), admin)
            .await
            .unwrap();
        assert_eq!(with_file.uploaded_by, Some(admin));

        let other = seed_admin(&pool, "grace@example.com").await;
        let edited = update_project(
            &pool,
            &storage,
            project.id,
            &MultipartForm::from_fields(&[("featured", "true")]),
            other,
        )
        .await
        .unwrap();
        assert!(edited.featured);
        assert_eq!(edited.uploaded_by, Some(admin));
        assert_eq!(edited.image_key, with_file.image_key);
    }

    #[tokio::test]
    async fn test_project_image_survives_concurrent_edits() {
        let Some(pool) = isolated_pool().await else { return };
        let admin = seed_admin(&pool, "ada@example.com").await;
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn FileStorage> = Arc::new(DiskStorage::new(dir.path(), None));
        let project_id = seed_project(&pool, None).await.id;
        update_project(&pool, storage.as_ref(), project_id, &with_image(&[]), admin)
            .await
            .unwrap();

        for round in 0..20 {
            let mut tasks = Vec::new();
            for i in 0..3 {
                let pool = pool.clone();
                let storage = storage.clone();
                let form = if i == 0 {
                    with_image(&[])
                } else {
                    MultipartForm::from_fields(&[("sort_order", "2")])
                };
                tasks.push(tokio::spawn(async move {
                    update_project(&pool, storage.as_ref(), project_id, &form, admin)
                        .await
                        .map(|_| ())
                }));
            }
            for task in tasks {
                task.await.unwrap().unwrap();
            }

            let row = store::get(&pool, project_id).await.unwrap().unwrap();
            let key = row.image_key.expect("project keeps its image");
            assert!(
                storage.load(&key).await.is_ok(),
                "round {round}: project points at deleted {key}"
            );
        }
    }
}
