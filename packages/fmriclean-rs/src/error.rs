use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("no raw-data segment in recording path: {0}")]
    DatasetLayout(String),

    #[error("transform '{stage}' failed: {reason}")]
    Transform { stage: String, reason: String },

    #[error("report destination must be a concrete file path: {0}")]
    InvalidDestination(String),

    #[error("input file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("failed to parse {0}")]
    Parse(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CleanError {
    /// Build a transform failure for a named stage.
    pub fn transform(stage: &str, reason: impl Into<String>) -> Self {
        CleanError::Transform {
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CleanError>;
