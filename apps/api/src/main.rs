mod admin;
mod auth;
mod config;
mod content;
mod cv;
mod db;
mod errors;
mod feedback;
mod messages;
mod models;
mod projects;
mod routes;
mod state;
mod storage;
mod uploads;
mod urls;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::JwtKeys;
use crate::config::{Config, StorageBackend};
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{DiskStorage, FileStorage, S3Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        auth::store::ensure_bootstrap_admin(&db, email, password).await?;
    } else {
        warn!("ADMIN_EMAIL / ADMIN_PASSWORD not set; no bootstrap admin will be created");
    }

    // Initialize file storage
    let storage: Arc<dyn FileStorage> = match &config.storage {
        StorageBackend::Disk => {
            tokio::fs::create_dir_all(&config.upload_dir)
                .await
                .with_context(|| format!("creating upload dir '{}'", config.upload_dir))?;
            info!("Disk storage at {}", config.upload_dir);
            Arc::new(DiskStorage::new(
                &config.upload_dir,
                config.public_base_url.clone(),
            ))
        }
        StorageBackend::S3(s3) => Arc::new(S3Storage::connect(s3).await),
    };

    let jwt = Arc::new(JwtKeys::new(&config.jwt_secret, config.jwt_expiry_hours));
    info!("JWT sessions expire after {}h", config.jwt_expiry_hours);

    // Build app state
    let state = AppState {
        db,
        storage,
        jwt,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config.cors_origins));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Permissive when no origins are configured; otherwise restricted to them.
fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{o}'");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
