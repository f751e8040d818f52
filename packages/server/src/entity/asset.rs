use common::UploadedAsset;
use serde::{Deserialize, Serialize};

/// Pointer to a file held by the asset host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    /// Public URL of the file.
    pub url: String,
    /// Host-side id, needed to delete the file later.
    pub public_id: String,
}

impl From<UploadedAsset> for AssetRef {
    fn from(asset: UploadedAsset) -> Self {
        Self {
            url: asset.url,
            public_id: asset.public_id,
        }
    }
}
