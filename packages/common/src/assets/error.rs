use thiserror::Error;

/// Errors that can occur while talking to an asset host.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The file extension is not accepted for the requested asset kind.
    #[error("unsupported {kind} format: {extension}")]
    UnsupportedFormat { kind: &'static str, extension: String },

    /// The upload exceeds the configured size limit.
    #[error("asset exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    /// A public id that does not address anything this host manages.
    #[error("invalid public id: {0}")]
    InvalidPublicId(String),

    /// The backend is selected in config but cannot be built.
    #[error("asset host misconfigured: {0}")]
    Config(String),

    #[error("asset IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote host rejected or failed the request.
    #[error("remote asset host error: {0}")]
    Remote(String),
}
