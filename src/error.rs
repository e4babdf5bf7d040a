use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropSyncError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to fetch crops data: {0}")]
    CatalogUnavailable(String),

    #[error("Malformed local state under '{key}': {reason}")]
    MalformedLocalState { key: String, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No crop selected")]
    NoSelection,

    #[error("Registration failed. Try again. ({0})")]
    RegistrationFailed(String),
}

pub type Result<T> = std::result::Result<T, CropSyncError>;
