use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{store, JwtError};
use crate::errors::AppError;
use crate::state::AppState;

/// Authenticated admin, inserted into request extensions by `require_admin`.
#[derive(Clone, Debug)]
pub struct AuthAdmin {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Rejects requests without a valid bearer token for an existing admin.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(request.headers())?;

    let claims = state.jwt.verify(token).map_err(|e| match e {
        JwtError::Expired => AppError::Unauthorized("Session has expired".to_string()),
        other => {
            tracing::debug!("Rejected token: {other}");
            AppError::Unauthorized("Invalid token".to_string())
        }
    })?;

    // Tokens outlive deleted accounts; the row is the source of truth.
    let admin = store::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Admin account no longer exists".to_string()))?;

    request.extensions_mut().insert(AuthAdmin {
        id: admin.id,
        email: admin.email,
        name: admin.name,
    });

    Ok(next.run(request).await)
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthorized("Authorization header must use Bearer".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthorized(
            "Authorization header must use Bearer".to_string(),
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Empty bearer token".to_string()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn test_bearer_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_scheme_case_insensitive() {
        assert_eq!(extract_bearer(&headers("bearer tok")).unwrap(), "tok");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            extract_bearer(&HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_basic_scheme_rejected() {
        assert!(extract_bearer(&headers("Basic dXNlcjpwYXNz")).is_err());
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(extract_bearer(&headers("Bearer   ")).is_err());
        assert!(extract_bearer(&headers("Bearer")).is_err());
    }
}
