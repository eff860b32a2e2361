use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}
