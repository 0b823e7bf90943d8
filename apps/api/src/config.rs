use anyhow::{bail, Context, Result};

use crate::auth::MAX_EXPIRY_HOURS;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where uploaded images and CVs are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Disk,
    S3(S3Config),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub port: u16,
    pub rust_log: String,
    /// Prefix for asset URLs handed to the frontend, e.g. `https://api.example.com`.
    pub public_base_url: Option<String>,
    pub upload_dir: String,
    pub storage: StorageBackend,
    pub max_upload_bytes: usize,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Empty means permissive CORS.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = match optional("STORAGE_BACKEND")
            .unwrap_or_else(|| "disk".to_string())
            .to_lowercase()
            .as_str()
        {
            "disk" => StorageBackend::Disk,
            "s3" => StorageBackend::S3(S3Config {
                bucket: require("S3_BUCKET")?,
                endpoint: require("S3_ENDPOINT")?,
                public_url: require("S3_PUBLIC_URL")?,
                aws_access_key_id: require("AWS_ACCESS_KEY_ID")?,
                aws_secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            other => bail!("STORAGE_BACKEND must be 'disk' or 's3', got '{other}'"),
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            jwt_secret: require("JWT_SECRET")?,
            jwt_expiry_hours: expiry_hours(optional("JWT_EXPIRY_HOURS"))?,
            port: optional("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            public_base_url: optional("PUBLIC_BASE_URL"),
            upload_dir: optional("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            storage,
            max_upload_bytes: match optional("MAX_UPLOAD_BYTES") {
                Some(v) => v
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
            cors_origins: optional("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn expiry_hours(raw: Option<String>) -> Result<i64> {
    let hours = raw
        .unwrap_or_else(|| "24".to_string())
        .parse::<i64>()
        .context("JWT_EXPIRY_HOURS must be an integer")?;
    if !(1..=MAX_EXPIRY_HOURS).contains(&hours) {
        bail!("JWT_EXPIRY_HOURS must be between 1 and {MAX_EXPIRY_HOURS}, got {hours}");
    }
    Ok(hours)
}
