use std::path::Path;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tokio::fs;

use super::error::AssetError;
use super::traits::{AssetHost, AssetKind, UploadedAsset, extension_of};
use crate::config::S3Config;

/// Asset host backed by an S3-compatible bucket.
pub struct S3AssetHost {
    bucket: Box<Bucket>,
    public_base_url: String,
    max_size: u64,
}

impl S3AssetHost {
    pub fn new(
        config: &S3Config,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, AssetError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AssetError::Config(e.to_string()))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| AssetError::Config(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }
}

#[async_trait]
impl AssetHost for S3AssetHost {
    async fn upload(
        &self,
        local_path: &Path,
        kind: AssetKind,
    ) -> Result<UploadedAsset, AssetError> {
        let extension = extension_of(local_path).unwrap_or_default();
        if !kind.allowed_extensions().contains(&extension.as_str()) {
            return Err(AssetError::UnsupportedFormat {
                kind: kind.as_str(),
                extension,
            });
        }

        let content = fs::read(local_path).await?;
        let size = content.len() as u64;
        if size > self.max_size {
            return Err(AssetError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let key = format!("{}/{}.{}", kind, uuid::Uuid::new_v4(), extension);
        let content_type = mime_guess::from_ext(&extension).first_or_octet_stream();

        let response = self
            .bucket
            .put_object_with_content_type(&key, &content, content_type.as_ref())
            .await
            .map_err(|e| AssetError::Remote(e.to_string()))?;
        if !(200..300).contains(&response.status_code()) {
            return Err(AssetError::Remote(format!(
                "put {key} returned status {}",
                response.status_code()
            )));
        }

        tracing::debug!(key = %key, bytes = size, "Asset uploaded to bucket");

        Ok(UploadedAsset {
            url: format!("{}/{}", self.public_base_url, key),
            public_id: key,
            duration: None,
            bytes: size,
        })
    }

    async fn delete(&self, public_id: &str, kind: AssetKind) -> Result<bool, AssetError> {
        if !public_id.starts_with(&format!("{kind}/")) || public_id.contains("..") {
            return Err(AssetError::InvalidPublicId(public_id.to_string()));
        }

        let response = self
            .bucket
            .delete_object(public_id)
            .await
            .map_err(|e| AssetError::Remote(e.to_string()))?;
        match response.status_code() {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(AssetError::Remote(format!(
                "delete {public_id} returned status {status}"
            ))),
        }
    }
}
