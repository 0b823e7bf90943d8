use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::project::ProjectRow;

const PROJECT_COLUMNS: &str = "id, title, description, technologies, category, live_url, repo_url, \
     featured, sort_order, image_key, uploaded_by, created_at, updated_at";

/// Column values for inserts and full-row updates.
#[derive(Debug)]
pub struct ProjectWrite {
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
}

#[derive(Debug, Default, Clone)]
pub struct ProjectFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

pub async fn list(pool: &PgPool, filter: &ProjectFilter) -> Result<Vec<ProjectRow>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE TRUE"));
    if let Some(category) = &filter.category {
        query.push(" AND lower(category) = lower(").push_bind(category).push(")");
    }
    if let Some(featured) = filter.featured {
        query.push(" AND featured = ").push_bind(featured);
    }
    query.push(" ORDER BY sort_order ASC, created_at DESC");

    query.build_query_as::<ProjectRow>().fetch_all(pool).await
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, project: &ProjectWrite) -> Result<ProjectRow, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "INSERT INTO projects
            (id, title, description, technologies, category, live_url, repo_url,
             featured, sort_order, image_key, uploaded_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.technologies)
    .bind(&project.category)
    .bind(&project.live_url)
    .bind(&project.repo_url)
    .bind(project.featured)
    .bind(project.sort_order)
    .bind(&project.image_key)
    .bind(project.uploaded_by)
    .fetch_one(pool)
    .await
}

/// Reads a project and holds its row lock until the transaction ends.
pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    project: &ProjectWrite,
) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "UPDATE projects SET
            title = $2, description = $3, technologies = $4, category = $5,
            live_url = $6, repo_url = $7, featured = $8, sort_order = $9,
            image_key = $10, uploaded_by = $11, updated_at = now()
         WHERE id = $1
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.technologies)
    .bind(&project.category)
    .bind(&project.live_url)
    .bind(&project.repo_url)
    .bind(project.featured)
    .bind(project.sort_order)
    .bind(&project.image_key)
    .bind(project.uploaded_by)
    .fetch_optional(conn)
    .await
}

/// Deletes a project and returns its image key, if the row existed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Option<String>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>("DELETE FROM projects WHERE id = $1 RETURNING image_key")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM projects")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{isolated_pool, seed_admin};

    fn project(title: &str, category: &str, featured: bool, sort_order: i32) -> ProjectWrite {
        ProjectWrite {
            title: title.to_string(),
            description: format!("{title} description"),
            technologies: vec!["Rust".to_string()],
            category: category.to_string(),
            live_url: None,
            repo_url: None,
            featured,
            sort_order,
            image_key: None,
            uploaded_by: None,
        }
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let Some(pool) = isolated_pool().await else { return };
        insert(&pool, &project("Later", "Web", false, 2)).await.unwrap();
        insert(&pool, &project("First", "web", true, 1)).await.unwrap();
        insert(&pool, &project("Tool", "CLI", true, 0)).await.unwrap();

        let all = list(&pool, &ProjectFilter::default()).await.unwrap();
        let titles: Vec<_> = all.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Tool", "First", "Later"]);

        let web = list(
            &pool,
            &ProjectFilter {
                category: Some("WEB".to_string()),
                featured: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(web.len(), 2);

        let featured_web = list(
            &pool,
            &ProjectFilter {
                category: Some("web".to_string()),
                featured: Some(true),
            },
        )
        .await
        .unwrap();
        assert_eq!(featured_web.len(), 1);
        assert_eq!(featured_web[0].title, "First");
        assert_eq!(count(&pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_returns_image_key() {
        let Some(pool) = isolated_pool().await else { return };
        let mut write = project("Shot", "", false, 0);
        write.image_key = Some("images/shot.png".to_string());
        let row = insert(&pool, &write).await.unwrap();

        assert_eq!(
            delete(&pool, row.id).await.unwrap(),
            Some(Some("images/shot.png".to_string()))
        );
        assert_eq!(delete(&pool, row.id).await.unwrap(), None);
        assert!(get(&pool, row.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_uploader_keeps_project() {
        let Some(pool) = isolated_pool().await else { return };
        let admin = seed_admin(&pool, "ada@example.com").await;
        let mut write = project("Mine", "", false, 0);
        write.uploaded_by = Some(admin);
        let row = insert(&pool, &write).await.unwrap();

        assert!(crate::auth::store::delete(&pool, admin).await.unwrap());
        let row = get(&pool, row.id).await.unwrap().unwrap();
        assert_eq!(row.uploaded_by, None);
    }
}
