use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::storage::FileStorage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Disk by default; S3 when `STORAGE_BACKEND=s3`.
    pub storage: Arc<dyn FileStorage>,
    pub jwt: Arc<JwtKeys>,
    pub config: Config,
}
