use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use tracing::info;

use crate::auth::AuthAdmin;
use crate::cv::store::{self, CvWrite};
use crate::errors::AppError;
use crate::models::cv::{CvRow, CvView};
use crate::state::AppState;
use crate::storage::discard;
use crate::uploads::{content_type_for, MultipartForm, PendingFile, UploadKind};

/// POST /api/cv (multipart field `cv`)
///
/// The new record is committed before older ones and their files are removed,
/// so a failed upload never leaves the site without a CV.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CvView>), AppError> {
    let form = MultipartForm::read(multipart, "cv", UploadKind::Document).await?;
    let file = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::Validation("cv file is required".to_string()))?;

    let mut pending =
        PendingFile::stage(state.storage.as_ref(), Some(file), UploadKind::Document).await?;
    let file_key = pending.resolve(None, false).unwrap_or_default();
    let original_name = sanitize_filename(&file.original_name);

    let replaced = store::replace(
        &state.db,
        CvWrite {
            file_key: &file_key,
            original_name: &original_name,
            content_type: &file.content_type,
            size_bytes: file.size() as i64,
            uploaded_by: Some(admin.id),
        },
    )
    .await
    .map_err(AppError::from);
    let (row, superseded) = pending.settle(state.storage.as_ref(), replaced).await?;

    for key in &superseded {
        discard(state.storage.as_ref(), Some(key.as_str())).await;
    }

    info!(
        "CV {} uploaded by admin {} ({} superseded)",
        row.id,
        admin.id,
        superseded.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(CvView::from_row(row, state.storage.as_ref())),
    ))
}

/// GET /api/cv
pub async fn handle_get_cv(State(state): State<AppState>) -> Result<Json<CvView>, AppError> {
    let row = store::latest(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No CV has been uploaded".to_string()))?;
    Ok(Json(CvView::from_row(row, state.storage.as_ref())))
}

/// GET /api/cv/download
pub async fn handle_download_cv(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let row = store::latest(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No CV has been uploaded".to_string()))?;
    let bytes = state.storage.load(&row.file_key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, download_content_type(&row)),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    sanitize_filename(&row.original_name)
                ),
            ),
        ],
        bytes,
    ))
}

/// Records written before types were canonicalized may hold whatever the
/// browser declared; those fall back to the type implied by the file name.
fn download_content_type(row: &CvRow) -> String {
    if row.content_type != "application/octet-stream" && !row.content_type.is_empty() {
        return row.content_type.clone();
    }
    row.original_name
        .rsplit_once('.')
        .and_then(|(_, ext)| content_type_for(UploadKind::Document, ext))
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Strips directories and anything unsafe inside a quoted header value.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c == ' ').to_string();
    if cleaned.is_empty() {
        "cv".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("C:\\Users\\me\\Resume.pdf"), "Resume.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
    }

    #[test]
    fn test_sanitize_replaces_header_breakers() {
        assert_eq!(sanitize_filename("my \"cv\";.pdf"), "my _cv__.pdf");
        assert_eq!(sanitize_filename("résumé.pdf"), "r_sum_.pdf");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_filename(""), "cv");
        assert_eq!(sanitize_filename("..."), "cv");
        assert_eq!(sanitize_filename("uploads/"), "cv");
    }

    fn cv_row(original_name: &str, content_type: &str) -> CvRow {
        CvRow {
            id: uuid::Uuid::new_v4(),
            file_key: "cv/a.pdf".to_string(),
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            size_bytes: 4,
            uploaded_by: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_download_type_from_extension_when_generic() {
        assert_eq!(
            download_content_type(&cv_row("Resume.PDF", "application/octet-stream")),
            "application/pdf"
        );
        assert_eq!(
            download_content_type(&cv_row("cv.doc", "application/msword")),
            "application/msword"
        );
        assert_eq!(
            download_content_type(&cv_row("cv", "application/octet-stream")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_sanitize_keeps_ordinary_names() {
        assert_eq!(sanitize_filename("Jane Doe CV (2024).pdf"), "Jane Doe CV (2024).pdf");
    }
}
