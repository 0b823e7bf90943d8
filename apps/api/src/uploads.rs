//! Multipart intake for admin forms that carry an optional file.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::storage::{discard, FileStorage};

/// What an upload slot accepts, and where it lands in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Document,
}

impl UploadKind {
    pub fn dir(self) -> &'static str {
        match self {
            UploadKind::Image => "images",
            UploadKind::Document => "cv",
        }
    }

    /// (extension, accepted MIME types)
    fn accepted(self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            UploadKind::Image => IMAGE_TYPES,
            UploadKind::Document => DOCUMENT_TYPES,
        }
    }
}

const JPEG: &[&str] = &["image/jpeg", "image/jpg", "image/pjpeg"];

const IMAGE_TYPES: &[(&str, &[&str])] = &[
    ("jpg", JPEG),
    ("jpeg", JPEG),
    ("png", &["image/png"]),
    ("webp", &["image/webp"]),
    ("gif", &["image/gif"]),
    ("svg", &["image/svg+xml"]),
];

const DOCUMENT_TYPES: &[(&str, &[&str])] = &[
    ("pdf", &["application/pdf"]),
    ("doc", &["application/msword"]),
    (
        "docx",
        &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
    ),
];

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub extension: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Builds a fresh storage key: `<dir>/<millis>-<uuid>.<ext>`.
    pub fn storage_key(&self, kind: UploadKind) -> String {
        format!(
            "{}/{}-{}.{}",
            kind.dir(),
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            self.extension
        )
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Canonical MIME type for an accepted extension in this slot.
pub fn content_type_for(kind: UploadKind, extension: &str) -> Option<&'static str> {
    kind.accepted()
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .and_then(|(_, types)| types.first().copied())
}

/// Checks that a file's declared type and extension agree with the slot.
/// Returns the lowercase extension and the canonical MIME type for it.
pub fn validate_file(
    kind: UploadKind,
    original_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Result<(String, &'static str), AppError> {
    if bytes.is_empty() {
        return Err(AppError::Validation(format!(
            "Uploaded file '{original_name}' is empty"
        )));
    }

    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "File '{original_name}' has no extension"
            ))
        })?;

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    let allowed = kind
        .accepted()
        .iter()
        .find(|(ext, _)| *ext == extension)
        .ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "Files of type .{extension} are not accepted here"
            ))
        })?;

    // Some browsers send application/octet-stream for valid files; the
    // extension check above still applies to them.
    if mime != "application/octet-stream" && !allowed.1.contains(&mime.as_str()) {
        return Err(AppError::UnsupportedMediaType(format!(
            "Content type '{mime}' does not match .{extension}"
        )));
    }

    let canonical = allowed.1.first().copied().unwrap_or("application/octet-stream");
    Ok((extension, canonical))
}

/// Text fields plus at most one file, read from a multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    pub async fn read(
        mut multipart: Multipart,
        file_field: &str,
        kind: UploadKind,
    ) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    if name != file_field {
                        return Err(AppError::Validation(format!(
                            "Unexpected file field '{name}'"
                        )));
                    }
                    if form.file.is_some() {
                        return Err(AppError::Validation(format!(
                            "Only one '{file_field}' file may be uploaded"
                        )));
                    }
                    let declared = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    // An empty file input submits a part with no name and no bytes.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    let (extension, content_type) =
                        validate_file(kind, &file_name, &declared, &bytes)?;
                    form.file = Some(UploadedFile {
                        original_name: file_name,
                        content_type: content_type.to_string(),
                        extension,
                        bytes,
                    });
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    #[cfg(test)]
    pub fn from_fields(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }

    /// Trimmed value, `None` when absent. Present-but-blank yields `Some("")`.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(|v| v.trim().to_string())
    }

    pub fn required(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    pub fn flag(&self, name: &str) -> Result<Option<bool>, AppError> {
        match self.text(name).as_deref() {
            None | Some("") => Ok(None),
            Some("true") | Some("1") | Some("on") | Some("yes") => Ok(Some(true)),
            Some("false") | Some("0") | Some("off") | Some("no") => Ok(Some(false)),
            Some(other) => Err(AppError::Validation(format!(
                "{name} must be a boolean, got '{other}'"
            ))),
        }
    }

    pub fn integer(&self, name: &str) -> Result<Option<i32>, AppError> {
        match self.text(name).as_deref() {
            None | Some("") => Ok(None),
            Some(v) => v
                .parse::<i32>()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("{name} must be an integer"))),
        }
    }

    /// Accepts a JSON array string (`["Rust","Axum"]`) or a comma list
    /// (`Rust, Axum`). Blank entries are dropped.
    pub fn list(&self, name: &str) -> Result<Option<Vec<String>>, AppError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };
        let items: Vec<String> = if raw.starts_with('[') {
            serde_json::from_str::<Vec<String>>(&raw).map_err(|_| {
                AppError::Validation(format!("{name} must be a JSON array of strings"))
            })?
        } else {
            raw.split(',').map(str::to_string).collect()
        };
        Ok(Some(
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ))
    }
}

/// A file slot change staged in storage but not yet committed to its row.
///
/// `stage` writes any fresh upload before the row is touched. `resolve` is
/// called with the key read from the locked row and decides what the row
/// keeps. `settle` then reacts to the row write: on success the superseded
/// file is removed, on failure the fresh one is.
#[derive(Debug)]
pub struct PendingFile {
    key: Option<String>,
    fresh: Option<String>,
    previous: Option<String>,
}

impl PendingFile {
    pub async fn stage(
        storage: &dyn FileStorage,
        upload: Option<&UploadedFile>,
        kind: UploadKind,
    ) -> Result<Self, AppError> {
        let fresh = match upload {
            Some(file) => {
                let key = file.storage_key(kind);
                storage
                    .save(&key, file.bytes.clone(), &file.content_type)
                    .await?;
                Some(key)
            }
            None => None,
        };

        Ok(Self {
            key: fresh.clone(),
            fresh,
            previous: None,
        })
    }

    /// Whether a new file was written by `stage`.
    pub fn is_fresh(&self) -> bool {
        self.fresh.is_some()
    }

    /// Decides the key the row should hold, given the one it holds now.
    /// `current` must come from the row as read under its write lock.
    pub fn resolve(&mut self, current: Option<String>, remove: bool) -> Option<String> {
        self.key = match (&self.fresh, remove) {
            (Some(k), _) => Some(k.clone()),
            (None, true) => None,
            (None, false) => current.clone(),
        };
        self.previous = current;
        self.key.clone()
    }

    pub async fn settle<T>(
        self,
        storage: &dyn FileStorage,
        outcome: Result<T, AppError>,
    ) -> Result<T, AppError> {
        match outcome {
            Ok(value) => {
                if self.previous.is_some() && self.previous != self.key {
                    discard(storage, self.previous.as_deref()).await;
                }
                Ok(value)
            }
            Err(e) => {
                discard(storage, self.fresh.as_deref()).await;
                Err(e)
            }
        }
    }
}
