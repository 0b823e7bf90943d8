use sqlx::PgPool;
use uuid::Uuid;

use crate::models::cv::CvRow;

const CV_COLUMNS: &str = "id, file_key, original_name, content_type, size_bytes, uploaded_by, created_at";

pub struct CvWrite<'a> {
    pub file_key: &'a str,
    pub original_name: &'a str,
    pub content_type: &'a str,
    pub size_bytes: i64,
    pub uploaded_by: Option<Uuid>,
}

pub async fn latest(pool: &PgPool) -> Result<Option<CvRow>, sqlx::Error> {
    sqlx::query_as::<_, CvRow>(&format!(
        "SELECT {CV_COLUMNS} FROM cv_files ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

/// Inserts the new CV and removes every other record in one transaction.
/// Returns the new row plus the file keys of the removed records.
///
/// Concurrent replaces queue on the table lock, so each one's delete sees
/// the rows committed before it and exactly one record survives.
pub async fn replace(pool: &PgPool, cv: CvWrite<'_>) -> Result<(CvRow, Vec<String>), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("LOCK TABLE cv_files IN EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let row = sqlx::query_as::<_, CvRow>(&format!(
        "INSERT INTO cv_files (id, file_key, original_name, content_type, size_bytes, uploaded_by)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {CV_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(cv.file_key)
    .bind(cv.original_name)
    .bind(cv.content_type)
    .bind(cv.size_bytes)
    .bind(cv.uploaded_by)
    .fetch_one(&mut *tx)
    .await?;

    let superseded: Vec<String> =
        sqlx::query_scalar("DELETE FROM cv_files WHERE id <> $1 RETURNING file_key")
            .bind(row.id)
            .fetch_all(&mut *tx)
            .await?;

    tx.commit().await?;
    Ok((row, superseded))
}

pub async fn exists(pool: &PgPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cv_files)")
        .fetch_one(pool)
        .await
}
