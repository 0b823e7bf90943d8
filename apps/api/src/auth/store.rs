use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::errors::AppError;
use crate::models::admin::AdminUserRow;

const ADMIN_COLUMNS: &str = "id, email, name, password_hash, created_at, last_login_at";

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<AdminUserRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminUserRow>(&format!(
        "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AdminUserRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminUserRow>(&format!(
        "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<AdminUserRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminUserRow>(&format!(
        "SELECT {ADMIN_COLUMNS} FROM admin_users ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await
}

/// Inserts a new admin. `email` must already be normalized.
/// A duplicate email surfaces as `Conflict`.
pub async fn create(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<AdminUserRow, AppError> {
    let row = sqlx::query_as::<_, AdminUserRow>(&format!(
        "INSERT INTO admin_users (id, email, name, password_hash)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (email) DO NOTHING
         RETURNING {ADMIN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let row = row.ok_or_else(|| AppError::Conflict(format!("An admin with email {email} already exists")))?;
    info!("Created admin {} ({})", row.id, row.email);
    Ok(row)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM admin_users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn touch_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admin_users SET last_login_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_password_hash(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admin_users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Creates the configured bootstrap admin when no admin with that email
/// exists yet. Existing admins are left untouched.
pub async fn ensure_bootstrap_admin(pool: &PgPool, email: &str, password: &str) -> Result<()> {
    let email = crate::validation::email(email)
        .map_err(|e| anyhow::anyhow!("ADMIN_EMAIL is invalid: {e}"))?;
    crate::validation::password(password)
        .map_err(|e| anyhow::anyhow!("ADMIN_PASSWORD is invalid: {e}"))?;

    if find_by_email(pool, &email).await?.is_some() {
        info!("Bootstrap admin {email} already present");
        return Ok(());
    }

    let hash = hash_password(password)
        .await
        .map_err(|e| anyhow::anyhow!("hashing bootstrap password failed: {e}"))?;
    match create(pool, &email, "Administrator", &hash).await {
        Ok(_) | Err(AppError::Conflict(_)) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("creating bootstrap admin failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::isolated_pool;

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let Some(pool) = isolated_pool().await else { return };
        create(&pool, "ada@example.com", "Ada", "hash").await.unwrap();
        let err = create(&pool, "ada@example.com", "Imposter", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(list(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_touch_last_login_sets_timestamp() {
        let Some(pool) = isolated_pool().await else { return };
        let admin = create(&pool, "ada@example.com", "Ada", "hash").await.unwrap();
        assert!(admin.last_login_at.is_none());

        touch_last_login(&pool, admin.id).await.unwrap();
        let admin = find_by_id(&pool, admin.id).await.unwrap().unwrap();
        assert!(admin.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_is_idempotent() {
        let Some(pool) = isolated_pool().await else { return };
        ensure_bootstrap_admin(&pool, " Owner@Example.com ", "long-enough-pw")
            .await
            .unwrap();
        ensure_bootstrap_admin(&pool, "owner@example.com", "a-different-pw")
            .await
            .unwrap();

        let admins = list(&pool).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].email, "owner@example.com");
        assert!(crate::auth::password::verify_password("long-enough-pw", &admins[0].password_hash)
            .await
            .unwrap());
    }
}
