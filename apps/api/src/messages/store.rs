use sqlx::PgPool;
use uuid::Uuid;

use crate::models::message::MessageRow;

const MESSAGE_COLUMNS: &str = "id, name, email, subject, body, is_read, created_at";

pub async fn insert(
    pool: &PgPool,
    name: &str,
    email: &str,
    subject: &str,
    body: &str,
) -> Result<MessageRow, sqlx::Error> {
    sqlx::query_as::<_, MessageRow>(&format!(
        "INSERT INTO messages (id, name, email, subject, body)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(subject)
    .bind(body)
    .fetch_one(pool)
    .await
}

/// Newest first; `unread_only` restricts to messages not yet read.
pub async fn list(pool: &PgPool, unread_only: bool) -> Result<Vec<MessageRow>, sqlx::Error> {
    sqlx::query_as::<_, MessageRow>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE ($1 = FALSE OR is_read = FALSE)
         ORDER BY created_at DESC"
    ))
    .bind(unread_only)
    .fetch_all(pool)
    .await
}

pub async fn set_read(pool: &PgPool, id: Uuid, is_read: bool) -> Result<Option<MessageRow>, sqlx::Error> {
    sqlx::query_as::<_, MessageRow>(&format!(
        "UPDATE messages SET is_read = $2 WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(id)
    .bind(is_read)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// (total, unread)
pub async fn counts(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE NOT is_read) FROM messages",
    )
    .fetch_one(pool)
    .await
}
