use std::collections::HashMap;
use std::path::Path;

use axum::extract::{FromRequest, Multipart, Request};
use common::AssetKind;
use common::assets::extension_of;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::error::AppError;

/// A file part spooled to a local temp file.
///
/// The temp file is removed when this value is dropped, whichever way the
/// request ends.
#[derive(Debug)]
pub struct TempUpload {
    file: NamedTempFile,
    file_name: String,
}

impl TempUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// A fully read `multipart/form-data` body: text fields in memory, file
/// fields in temp files that keep the original extension.
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, TempUpload>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// Take an optional file field, checking its extension against `kind`.
    pub fn take_file(&mut self, name: &str, kind: AssetKind) -> Result<Option<TempUpload>, AppError> {
        let Some(upload) = self.files.remove(name) else {
            return Ok(None);
        };
        kind.validate_extension(&upload.file_name)?;
        Ok(Some(upload))
    }

    pub fn require_file(&mut self, name: &str, kind: AssetKind) -> Result<TempUpload, AppError> {
        self.take_file(name, kind)?
            .ok_or_else(|| AppError::BadRequest(format!("{name} file is required")))
    }

    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e.body_text())))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            let file_name = field.file_name().map(str::to_string);
            match file_name {
                // Browsers send an empty part for an untouched file input.
                Some(file_name) if file_name.trim().is_empty() => continue,
                Some(file_name) => {
                    let mut builder = tempfile::Builder::new();
                    builder.prefix("vidhub-upload-");
                    let suffix = extension_of(Path::new(&file_name))
                        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
                        .map(|ext| format!(".{ext}"))
                        .unwrap_or_default();
                    builder.suffix(&suffix);
                    let temp = builder.tempfile().map_err(|e| {
                        AppError::Internal(format!("Failed to create temp file: {e}"))
                    })?;

                    let std_file = temp
                        .reopen()
                        .map_err(|e| AppError::Internal(format!("Failed to open temp file: {e}")))?;
                    let mut out = tokio::fs::File::from_std(std_file);
                    while let Some(chunk) = field.chunk().await.map_err(|e| {
                        AppError::BadRequest(format!("Upload read error: {}", e.body_text()))
                    })? {
                        out.write_all(&chunk)
                            .await
                            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
                    }
                    out.flush()
                        .await
                        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

                    form.files.insert(
                        name,
                        TempUpload {
                            file: temp,
                            file_name,
                        },
                    );
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read field {name}: {}", e.body_text()))
                    })?;
                    form.texts.insert(name, text);
                }
            }
        }
        Ok(form)
    }
}

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Self::read(multipart).await
    }
}
