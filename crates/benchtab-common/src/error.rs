use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    /// Missing required column or unexpected column set.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A score column that should be numeric holds non-numeric values.
    #[error("Numeric type error: {0}")]
    NumericType(String),

    /// Invalid combination of arguments or a violated operation precondition.
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Ambiguous source: table holds {n_sources} sources ({sources}); an explicit aggregate source name is required")]
    AmbiguousSource { n_sources: usize, sources: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;
