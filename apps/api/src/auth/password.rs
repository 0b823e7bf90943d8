use std::sync::OnceLock;

use anyhow::{anyhow, Context};

use crate::errors::AppError;

/// bcrypt work factor for stored admin passwords.
pub const HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST))
        .await
        .context("password hashing task panicked")?
        .map_err(|e| anyhow!("bcrypt hash failed: {e}"))?;
    Ok(hash)
}

/// Checks a candidate against a stored hash. A malformed stored hash counts
/// as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let matches = tokio::task::spawn_blocking(move || match bcrypt::verify(password, &hash) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {e}");
            false
        }
    })
    .await
    .context("password verification task panicked")?;
    Ok(matches)
}

/// Burns the same bcrypt work as a real check so unknown emails and wrong
/// passwords take comparable time.
pub async fn verify_against_dummy(password: &str) -> Result<(), AppError> {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    let hash = match DUMMY_HASH.get() {
        Some(h) => h.clone(),
        None => {
            let h = hash_password("portfolio-dummy-password").await?;
            DUMMY_HASH.get_or_init(|| h).clone()
        }
    };
    verify_password(password, &hash).await?;
    Ok(())
}
