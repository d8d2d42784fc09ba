use std::path::PathBuf;
use thiserror::Error;

/// Fatal library errors. Per-file trouble never lands here; it becomes a
/// `SkippedReason` in the scan outcome instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Root folder is not accessible: {0}")]
    InaccessibleRoot(PathBuf),

    #[error("Scan session error: {0}")]
    Session(String),
}
