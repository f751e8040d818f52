pub mod assets;
pub mod config;

pub use assets::{AssetError, AssetHost, AssetKind, UploadedAsset};
pub use config::{AssetBackend, AssetHostConfig};
