use common::{AssetHost, AssetKind};
use tracing::warn;

use crate::entity::asset::AssetRef;
use crate::error::AppError;
use crate::extractors::multipart::TempUpload;

/// Upload a spooled file and return the stored reference along with the
/// duration the host reported, if any.
pub async fn store(
    assets: &dyn AssetHost,
    upload: &TempUpload,
    kind: AssetKind,
) -> Result<(AssetRef, Option<f64>), AppError> {
    let uploaded = assets.upload(upload.path(), kind).await?;
    let duration = uploaded.duration;
    Ok((AssetRef::from(uploaded), duration))
}

/// Best-effort removal of an asset that is no longer (or never became)
/// referenced by a stored document.
pub async fn discard(assets: &dyn AssetHost, asset: &AssetRef, kind: AssetKind) {
    match assets.delete(&asset.public_id, kind).await {
        Ok(true) => {}
        Ok(false) => warn!(public_id = %asset.public_id, "Asset already gone"),
        Err(e) => warn!(public_id = %asset.public_id, error = %e, "Failed to delete asset"),
    }
}
