use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutobrainError {
    // Provider errors
    #[error("provider request failed: {0}")]
    Provider(String),

    #[error("provider response parse error: {0}")]
    ProviderParse(String),

    // Retrieval errors
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    // Config errors
    #[error("config error: {0}")]
    Config(String),

    // Graph errors
    #[error("graph invariant violated: {0}")]
    Invariant(String),

    #[error("run cancelled")]
    Cancelled,

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AutobrainError>;
