use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid detector config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid cut payload: {0}")]
    Payload(#[from] bincode::Error),

    #[error("not a .cuts file: magic bytes mismatch")]
    BadMagic,

    #[error("unsupported .cuts version {0}")]
    UnsupportedVersion(u16),

    #[error("payload checksum mismatch, file is corrupt")]
    ChecksumMismatch,

    /// The entry was computed for a different buffer or configuration.
    #[error("cache entry does not match the requested analysis")]
    Stale,
}
