use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("running database migrations failed")?;
    info!("Database migrations applied");
    Ok(())
}

/// Database fixtures for store tests.
///
/// Tests connect to `TEST_DATABASE_URL` and each get a private schema with
/// the migrations applied, so they can run in parallel against one server.
/// Without the variable the caller skips its test.
#[cfg(test)]
pub mod testing {
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use sqlx::PgPool;
    use uuid::Uuid;

    pub async fn isolated_pool() -> Option<PgPool> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return None;
        };

        let schema = format!("test_{}", Uuid::new_v4().simple());
        let bootstrap = PgPool::connect(&url)
            .await
            .expect("connecting to TEST_DATABASE_URL");
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&bootstrap)
            .await
            .expect("creating test schema");
        bootstrap.close().await;

        let options = url
            .parse::<PgConnectOptions>()
            .expect("parsing TEST_DATABASE_URL")
            .options([("search_path", schema.as_str())]);
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("connecting to test schema");
        super::run_migrations(&pool).await.expect("migrating test schema");
        Some(pool)
    }

    /// Inserts an admin row directly; the hash is never verified.
    pub async fn seed_admin(pool: &PgPool, email: &str) -> Uuid {
        crate::auth::store::create(pool, email, "Test Admin", "not-a-real-hash")
            .await
            .expect("seeding admin")
            .id
    }
}
