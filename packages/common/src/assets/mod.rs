mod error;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

pub use error::AssetError;
pub use traits::{AssetHost, AssetKind, UploadedAsset, extension_of};

use crate::config::{AssetBackend, AssetHostConfig};

/// Build the asset host selected by `config.backend`.
pub async fn from_config(config: &AssetHostConfig) -> Result<Arc<dyn AssetHost>, AssetError> {
    match config.backend {
        AssetBackend::Filesystem => {
            let host = filesystem::FilesystemAssetHost::new(
                config.root_dir.clone(),
                config.public_base_url.clone(),
                config.max_upload_size,
            )
            .await?;
            Ok(Arc::new(host))
        }
        #[cfg(feature = "object-storage")]
        AssetBackend::S3 => {
            let s3_config = config
                .s3
                .as_ref()
                .ok_or_else(|| AssetError::Config("missing [assets.s3] section".into()))?;
            let host = s3::S3AssetHost::new(
                s3_config,
                config.public_base_url.clone(),
                config.max_upload_size,
            )?;
            Ok(Arc::new(host))
        }
        #[cfg(not(feature = "object-storage"))]
        AssetBackend::S3 => Err(AssetError::Config(
            "the s3 backend requires the `object-storage` feature".into(),
        )),
    }
}
