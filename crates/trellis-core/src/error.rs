use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrellisError {
    // Graph wiring errors
    #[error("invalid graph configuration:\n{0}")]
    InvalidGraph(String),

    #[error("missing input key '{key}' for node '{node}'")]
    MissingInput { node: String, key: String },

    // Run errors
    #[error("run cancelled")]
    Cancelled,

    // Credential errors
    #[error("{0}")]
    Credential(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrellisError>;
