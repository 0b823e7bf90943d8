use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::content::{
    AboutRow, EducationItem, EducationRow, HeroRow, ServiceItem, ServicesRow,
};

pub struct HeroWrite<'a> {
    pub greeting: &'a str,
    pub name: &'a str,
    pub roles: &'a [String],
    pub description: &'a str,
    pub image_key: Option<&'a str>,
    pub uploaded_by: Option<Uuid>,
}

pub struct AboutWrite<'a> {
    pub heading: &'a str,
    pub bio: &'a str,
    pub years_experience: i32,
    pub projects_completed: i32,
    pub image_key: Option<&'a str>,
    pub uploaded_by: Option<Uuid>,
}

pub async fn get_hero(pool: &PgPool) -> Result<Option<HeroRow>, sqlx::Error> {
    sqlx::query_as::<_, HeroRow>(
        "SELECT greeting, name, roles, description, image_key, uploaded_by, updated_at
         FROM hero_content WHERE singleton",
    )
    .fetch_optional(pool)
    .await
}

/// Takes the hero write lock for the rest of the transaction and returns
/// the row as it stands. Readers are not blocked.
pub async fn lock_hero(conn: &mut PgConnection) -> Result<Option<HeroRow>, sqlx::Error> {
    sqlx::query("LOCK TABLE hero_content IN EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await?;
    sqlx::query_as::<_, HeroRow>(
        "SELECT greeting, name, roles, description, image_key, uploaded_by, updated_at
         FROM hero_content WHERE singleton",
    )
    .fetch_optional(&mut *conn)
    .await
}

pub async fn upsert_hero(conn: &mut PgConnection, hero: HeroWrite<'_>) -> Result<HeroRow, sqlx::Error> {
    sqlx::query_as::<_, HeroRow>(
        r#"
        INSERT INTO hero_content (singleton, greeting, name, roles, description, image_key, uploaded_by, updated_at)
        VALUES (TRUE, $1, $2, $3, $4, $5, $6, now())
        ON CONFLICT (singleton) DO UPDATE SET
            greeting = EXCLUDED.greeting,
            name = EXCLUDED.name,
            roles = EXCLUDED.roles,
            description = EXCLUDED.description,
            image_key = EXCLUDED.image_key,
            uploaded_by = EXCLUDED.uploaded_by,
            updated_at = now()
        RETURNING greeting, name, roles, description, image_key, uploaded_by, updated_at
        "#,
    )
    .bind(hero.greeting)
    .bind(hero.name)
    .bind(hero.roles)
    .bind(hero.description)
    .bind(hero.image_key)
    .bind(hero.uploaded_by)
    .fetch_one(conn)
    .await
}

pub async fn get_about(pool: &PgPool) -> Result<Option<AboutRow>, sqlx::Error> {
    sqlx::query_as::<_, AboutRow>(
        "SELECT heading, bio, years_experience, projects_completed, image_key, uploaded_by, updated_at
         FROM about_content WHERE singleton",
    )
    .fetch_optional(pool)
    .await
}

pub async fn lock_about(conn: &mut PgConnection) -> Result<Option<AboutRow>, sqlx::Error> {
    sqlx::query("LOCK TABLE about_content IN EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await?;
    sqlx::query_as::<_, AboutRow>(
        "SELECT heading, bio, years_experience, projects_completed, image_key, uploaded_by, updated_at
         FROM about_content WHERE singleton",
    )
    .fetch_optional(&mut *conn)
    .await
}

pub async fn upsert_about(conn: &mut PgConnection, about: AboutWrite<'_>) -> Result<AboutRow, sqlx::Error> {
    sqlx::query_as::<_, AboutRow>(
        r#"
        INSERT INTO about_content (singleton, heading, bio, years_experience, projects_completed, image_key, uploaded_by, updated_at)
        VALUES (TRUE, $1, $2, $3, $4, $5, $6, now())
        ON CONFLICT (singleton) DO UPDATE SET
            heading = EXCLUDED.heading,
            bio = EXCLUDED.bio,
            years_experience = EXCLUDED.years_experience,
            projects_completed = EXCLUDED.projects_completed,
            image_key = EXCLUDED.image_key,
            uploaded_by = EXCLUDED.uploaded_by,
            updated_at = now()
        RETURNING heading, bio, years_experience, projects_completed, image_key, uploaded_by, updated_at
        "#,
    )
    .bind(about.heading)
    .bind(about.bio)
    .bind(about.years_experience)
    .bind(about.projects_completed)
    .bind(about.image_key)
    .bind(about.uploaded_by)
    .fetch_one(conn)
    .await
}

pub async fn get_services(pool: &PgPool) -> Result<Option<ServicesRow>, sqlx::Error> {
    sqlx::query_as::<_, ServicesRow>(
        "SELECT heading, intro, items, updated_at FROM services_content WHERE singleton",
    )
    .fetch_optional(pool)
    .await
}

pub async fn upsert_services(
    pool: &PgPool,
    heading: &str,
    intro: &str,
    items: &[ServiceItem],
) -> Result<ServicesRow, sqlx::Error> {
    sqlx::query_as::<_, ServicesRow>(
        r#"
        INSERT INTO services_content (singleton, heading, intro, items, updated_at)
        VALUES (TRUE, $1, $2, $3, now())
        ON CONFLICT (singleton) DO UPDATE SET
            heading = EXCLUDED.heading,
            intro = EXCLUDED.intro,
            items = EXCLUDED.items,
            updated_at = now()
        RETURNING heading, intro, items, updated_at
        "#,
    )
    .bind(heading)
    .bind(intro)
    .bind(Json(items))
    .fetch_one(pool)
    .await
}

pub async fn get_education(pool: &PgPool) -> Result<Option<EducationRow>, sqlx::Error> {
    sqlx::query_as::<_, EducationRow>(
        "SELECT heading, items, updated_at FROM education_content WHERE singleton",
    )
    .fetch_optional(pool)
    .await
}

pub async fn upsert_education(
    pool: &PgPool,
    heading: &str,
    items: &[EducationItem],
) -> Result<EducationRow, sqlx::Error> {
    sqlx::query_as::<_, EducationRow>(
        r#"
        INSERT INTO education_content (singleton, heading, items, updated_at)
        VALUES (TRUE, $1, $2, now())
        ON CONFLICT (singleton) DO UPDATE SET
            heading = EXCLUDED.heading,
            items = EXCLUDED.items,
            updated_at = now()
        RETURNING heading, items, updated_at
        "#,
    )
    .bind(heading)
    .bind(Json(items))
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{isolated_pool, seed_admin};

    fn hero<'a>(name: &'a str, roles: &'a [String], uploaded_by: Option<Uuid>) -> HeroWrite<'a> {
        HeroWrite {
            greeting: "Hello",
            name,
            roles,
            description: "",
            image_key: None,
            uploaded_by,
        }
    }

    #[tokio::test]
    async fn test_empty_tables_read_as_none() {
        let Some(pool) = isolated_pool().await else { return };
        assert!(get_hero(&pool).await.unwrap().is_none());
        assert!(get_about(&pool).await.unwrap().is_none());
        assert!(get_services(&pool).await.unwrap().is_none());
        assert!(get_education(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repeated_upserts_keep_one_row() {
        let Some(pool) = isolated_pool().await else { return };
        let roles = vec!["Engineer".to_string()];
        let mut conn = pool.acquire().await.unwrap();
        upsert_hero(&mut conn, hero("Ada", &roles, None)).await.unwrap();
        let row = upsert_hero(&mut conn, hero("Grace", &roles, None)).await.unwrap();
        drop(conn);
        assert_eq!(row.name, "Grace");

        let item = ServiceItem {
            title: "Backend".to_string(),
            description: "APIs".to_string(),
            icon: "server".to_string(),
        };
        upsert_services(&pool, "Services", "", &[]).await.unwrap();
        let services = upsert_services(&pool, "What I do", "intro", &[item.clone()])
            .await
            .unwrap();
        assert_eq!(services.items.0, vec![item]);

        for table in ["hero_content", "services_content"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count, 1, "{table}");
        }
    }

    #[tokio::test]
    async fn test_deleting_uploader_keeps_content() {
        let Some(pool) = isolated_pool().await else { return };
        let admin = seed_admin(&pool, "ada@example.com").await;
        let roles = Vec::new();
        let mut conn = pool.acquire().await.unwrap();
        upsert_hero(&mut conn, hero("Ada", &roles, Some(admin))).await.unwrap();
        drop(conn);

        assert!(crate::auth::store::delete(&pool, admin).await.unwrap());
        let row = get_hero(&pool).await.unwrap().unwrap();
        assert_eq!(row.name, "Ada");
        assert_eq!(row.uploaded_by, None);
    }
}
