#[derive(Debug, thiserror::Error)]
pub enum CredexError {
    #[error("failed to read document dump: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
