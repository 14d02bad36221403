use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

/// Errors surfaced by the engine.
///
/// Unresolved columns, missing sheets and unmatched keys are not errors; they
/// come back as empty strings, empty lists or `None`.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Malformed title at column {column}: {message}")]
    MalformedTitle { column: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<calamine::Error> for QueryError {
    fn from(err: calamine::Error) -> Self {
        QueryError::Workbook(err.to_string())
    }
}
