use thiserror::Error;

/// Failure to turn a file into a configuration document.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("line {line}: {field} is assigned twice (first assignment on line {first})")]
    DuplicateAssignment {
        line: usize,
        first: usize,
        field: String,
    },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: unbalanced braces")]
    UnbalancedBraces { line: usize },

    #[error("unsupported document format: {path} (expected .gradle.kts, .toml or .json)")]
    UnsupportedFormat { path: String },

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Source line the error points at, for build-script errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            IngestError::DuplicateAssignment { line, .. }
            | IngestError::Malformed { line, .. }
            | IngestError::UnbalancedBraces { line } => Some(*line),
            _ => None,
        }
    }
}
