/// Errors raised by the tracker core (store, synchronizer, file store).
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("{0}")]
    Validation(String),
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("Unsupported file type: {extension}. Please upload a PDF or Word document.")]
    UnsupportedFileType { extension: String },
    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("file storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str) -> Self {
        TrackerError::NotFound { entity }
    }
}
