use crate::errors::AppError;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_BODY_LEN: usize = 5000;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Trims and requires a non-empty value no longer than `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    bounded_text(field, trimmed, max)
}

/// Trims and caps a value that may be empty.
pub fn bounded_text(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Lowercases and checks the rough shape `local@domain.tld`.
pub fn email(value: &str) -> Result<String, AppError> {
    let normalized = required_text("email", value, MAX_EMAIL_LEN)?.to_lowercase();
    let valid = match normalized.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !normalized.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation("email is not a valid address".to_string()));
    }
    Ok(normalized)
}

pub fn password(value: &str) -> Result<(), AppError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn rating(value: i16) -> Result<i16, AppError> {
    if !(1..=5).contains(&value) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(value)
}

/// Optional link: blank becomes `None`, anything else must be http(s).
pub fn optional_link(field: &str, value: Option<&str>) -> Result<Option<String>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if crate::urls::is_absolute_url(v) => Ok(Some(v.to_string())),
        Some(_) => Err(AppError::Validation(format!(
            "{field} must be an http(s) URL"
        ))),
    }
}
