use sqlx::PgPool;
use uuid::Uuid;

use crate::models::feedback::FeedbackRow;

const FEEDBACK_COLUMNS: &str = "id, name, role, message, rating, approved, created_at";

pub async fn insert(
    pool: &PgPool,
    name: &str,
    role: &str,
    message: &str,
    rating: i16,
) -> Result<FeedbackRow, sqlx::Error> {
    sqlx::query_as::<_, FeedbackRow>(&format!(
        "INSERT INTO feedback (id, name, role, message, rating)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {FEEDBACK_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(role)
    .bind(message)
    .bind(rating)
    .fetch_one(pool)
    .await
}

pub async fn list(pool: &PgPool, approved_only: bool) -> Result<Vec<FeedbackRow>, sqlx::Error> {
    sqlx::query_as::<_, FeedbackRow>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback
         WHERE ($1 = FALSE OR approved = TRUE)
         ORDER BY created_at DESC"
    ))
    .bind(approved_only)
    .fetch_all(pool)
    .await
}

pub async fn set_approved(
    pool: &PgPool,
    id: Uuid,
    approved: bool,
) -> Result<Option<FeedbackRow>, sqlx::Error> {
    sqlx::query_as::<_, FeedbackRow>(&format!(
        "UPDATE feedback SET approved = $2 WHERE id = $1 RETURNING {FEEDBACK_COLUMNS}"
    ))
    .bind(id)
    .bind(approved)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// (total, awaiting approval)
pub async fn counts(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE NOT approved) FROM feedback",
    )
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::isolated_pool;

    #[tokio::test]
    async fn test_public_list_hides_pending() {
        let Some(pool) = isolated_pool().await else { return };
        let kept = insert(&pool, "Ada", "CTO", "Great work", 5).await.unwrap();
        insert(&pool, "Eve", "", "Hmm", 2).await.unwrap();
        assert!(!kept.approved);
        assert!(list(&pool, true).await.unwrap().is_empty());

        let approved = set_approved(&pool, kept.id, true).await.unwrap().unwrap();
        assert!(approved.approved);

        let public = list(&pool, true).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, kept.id);
        assert_eq!(list(&pool, false).await.unwrap().len(), 2);
        assert_eq!(counts(&pool).await.unwrap(), (2, 1));
    }

    #[tokio::test]
    async fn test_rating_outside_range_refused_by_database() {
        let Some(pool) = isolated_pool().await else { return };
        assert!(insert(&pool, "Ada", "", "Too good", 6).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_feedback() {
        let Some(pool) = isolated_pool().await else { return };
        assert!(set_approved(&pool, Uuid::new_v4(), true).await.unwrap().is_none());
        assert!(!delete(&pool, Uuid::new_v4()).await.unwrap());
    }
}
