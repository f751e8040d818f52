use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::AssetError;
use super::traits::{AssetHost, AssetKind, UploadedAsset, extension_of};

/// Filesystem-backed asset host.
///
/// Assets are stored as `{root}/{kind}/{uuid}.{ext}`; the public id is the
/// path relative to `root` and the URL is that path appended to
/// `public_base_url`.
pub struct FilesystemAssetHost {
    root: PathBuf,
    public_base_url: String,
    max_size: u64,
}

impl FilesystemAssetHost {
    /// Create a new filesystem asset host.
    pub async fn new(
        root: PathBuf,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, AssetError> {
        for kind in [AssetKind::Image, AssetKind::Video] {
            fs::create_dir_all(root.join(kind.as_str())).await?;
        }
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a public id to a path under `root`, refusing anything that
    /// could escape the kind directory.
    fn resolve(&self, public_id: &str, kind: AssetKind) -> Result<PathBuf, AssetError> {
        let relative = Path::new(public_id);
        let mut components = relative.components();
        let in_kind_dir = matches!(
            components.next(),
            Some(Component::Normal(dir)) if dir == kind.as_str()
        );
        let rest_is_plain = components.clone().count() == 1
            && components.all(|c| matches!(c, Component::Normal(_)));

        if !in_kind_dir || !rest_is_plain {
            return Err(AssetError::InvalidPublicId(public_id.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl AssetHost for FilesystemAssetHost {
    async fn upload(
        &self,
        local_path: &Path,
        kind: AssetKind,
    ) -> Result<UploadedAsset, AssetError> {
        let size = fs::metadata(local_path).await?.len();
        if size > self.max_size {
            return Err(AssetError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let extension = extension_of(local_path).unwrap_or_default();
        if !kind.allowed_extensions().contains(&extension.as_str()) {
            return Err(AssetError::UnsupportedFormat {
                kind: kind.as_str(),
                extension,
            });
        }

        let public_id = format!("{}/{}.{}", kind, uuid::Uuid::new_v4(), extension);
        let target = self.root.join(&public_id);

        // Copy into the scratch dir first so a half-written file never
        // becomes reachable under its public URL.
        let temp_path = self.temp_path();
        if let Err(e) = fs::copy(local_path, &temp_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(public_id = %public_id, bytes = size, "Asset stored on disk");

        Ok(UploadedAsset {
            url: format!("{}/{}", self.public_base_url, public_id),
            public_id,
            duration: None,
            bytes: size,
        })
    }

    async fn delete(&self, public_id: &str, kind: AssetKind) -> Result<bool, AssetError> {
        let path = self.resolve(public_id, kind)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
