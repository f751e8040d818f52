use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use super::error::AssetError;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mov", "wmv", "mkv", "flv", "webm", "mpg", "mpeg", "3gp", "ts",
];

/// Resource class of an uploaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
        }
    }

    /// Lowercase file extensions accepted for this kind.
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            AssetKind::Image => IMAGE_EXTENSIONS,
            AssetKind::Video => VIDEO_EXTENSIONS,
        }
    }

    /// Check a file name's extension against [`Self::allowed_extensions`]
    /// and return the normalized (lowercase) extension.
    pub fn validate_extension(self, file_name: &str) -> Result<String, AssetError> {
        let extension = extension_of(Path::new(file_name)).unwrap_or_default();
        if self.allowed_extensions().contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(AssetError::UnsupportedFormat {
                kind: self.as_str(),
                extension,
            })
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase extension of a path, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// What the host hands back after a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedAsset {
    /// Publicly reachable URL of the asset.
    pub url: String,
    /// Host-side identifier used for deletion.
    pub public_id: String,
    /// Media duration in seconds, when the host can determine it.
    pub duration: Option<f64>,
    /// Stored size in bytes.
    pub bytes: u64,
}

/// External media host.
///
/// Callers own the local file passed to [`AssetHost::upload`]; hosts copy
/// from it and never delete it.
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Upload a local file, keeping its extension.
    async fn upload(&self, local_path: &Path, kind: AssetKind)
    -> Result<UploadedAsset, AssetError>;

    /// Delete an asset by public id.
    ///
    /// Returns `true` if the asset was deleted, `false` if it did not exist.
    async fn delete(&self, public_id: &str, kind: AssetKind) -> Result<bool, AssetError>;
}
