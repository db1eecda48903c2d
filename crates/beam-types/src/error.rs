use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeamError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Beam table {file}, line {line}: {message}")]
    TableError {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Example {example}: {message}")]
    GeometryError { example: usize, message: String },

    #[error("Unsupported facility: {0}")]
    UnsupportedFacility(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BeamError {
    /// Example index for per-example failures, `None` for facility-wide ones.
    pub fn example(&self) -> Option<usize> {
        match self {
            BeamError::GeometryError { example, .. } => Some(*example),
            _ => None,
        }
    }
}

pub type BeamResult<T> = Result<T, BeamError>;
