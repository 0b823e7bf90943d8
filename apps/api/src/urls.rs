//! Asset URL normalization.
//!
//! Stored file references come in several shapes: keys written by this
//! service (`images/171..-abc.png`), legacy paths written by upload
//! middleware on Windows hosts (`uploads\images\a.png`), leading-slash paths
//! (`/uploads/cv/a.pdf`), and absolute URLs pasted in by hand. Everything the
//! API hands to the frontend goes through here so clients always receive one
//! canonical form.

use url::Url;

/// Mount point for locally served uploads.
pub const UPLOADS_MOUNT: &str = "/uploads";

/// Reduces a stored reference to a storage key relative to the upload root.
/// References that climb out of the root with `..` reduce to an empty key.
pub fn normalize_key(stored: &str) -> String {
    let unified = stored.trim().replace('\\', "/");

    let mut rest = unified.as_str();
    loop {
        let before = rest;
        rest = rest.trim_start_matches("./").trim_start_matches('/');
        if let Some(stripped) = rest.strip_prefix("uploads/") {
            rest = stripped;
        }
        if rest == before {
            break;
        }
    }

    let segments: Vec<&str> = rest
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if segments.contains(&"..") {
        return String::new();
    }
    segments.join("/")
}

/// Returns true for references that already point at a full http(s) URL.
pub fn is_absolute_url(stored: &str) -> bool {
    Url::parse(stored.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Builds the URL clients should use for a stored file.
///
/// Returns `None` for empty references. Absolute URLs pass through untouched.
/// Without a base the mount-relative path is returned, which browsers
/// resolve against the API origin.
pub fn asset_url(base: Option<&str>, mount: &str, stored: &str) -> Option<String> {
    let trimmed = stored.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_absolute_url(trimmed) {
        return Some(trimmed.to_string());
    }

    let key = normalize_key(trimmed);
    if key.is_empty() {
        return None;
    }

    let mount = mount.trim_end_matches('/');
    let path = if mount.is_empty() {
        format!("/{key}")
    } else if mount.starts_with('/') || is_absolute_url(mount) {
        format!("{mount}/{key}")
    } else {
        format!("/{mount}/{key}")
    };

    match base.map(str::trim).filter(|b| !b.is_empty()) {
        Some(base) if !is_absolute_url(&path) => {
            Some(format!("{}{}", base.trim_end_matches('/'), path))
        }
        _ => Some(path),
    }
}
