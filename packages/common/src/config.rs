use std::path::PathBuf;

use serde::Deserialize;

/// Which asset host implementation to build at startup.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetBackend {
    /// Store uploads on local disk and serve them from `public_base_url`.
    #[default]
    Filesystem,
    /// Store uploads in an S3-compatible bucket. Requires the
    /// `object-storage` feature.
    S3,
}

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Use path-style addressing (`{endpoint}/{bucket}/{key}`). Default: true.
    #[serde(default = "default_path_style")]
    pub path_style: bool,
}

/// App-level asset host configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AssetHostConfig {
    #[serde(default)]
    pub backend: AssetBackend,
    /// Directory used by the filesystem backend. Default: "./data/assets".
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// URL prefix under which uploaded assets are reachable.
    /// Default: "http://127.0.0.1:8000/assets".
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Largest accepted upload in bytes. Default: 512 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

fn default_path_style() -> bool {
    true
}
fn default_root_dir() -> PathBuf {
    PathBuf::from("./data/assets")
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:8000/assets".into()
}
fn default_max_upload_size() -> u64 {
    512 * 1024 * 1024
}

impl Default for AssetHostConfig {
    fn default() -> Self {
        Self {
            backend: AssetBackend::default(),
            root_dir: default_root_dir(),
            public_base_url: default_public_base_url(),
            max_upload_size: default_max_upload_size(),
            s3: None,
        }
    }
}
