use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggError {
    #[error("field '{field}' not present in source schema")]
    SchemaMismatch { field: String },

    #[error("consumption field '{consumption}' has no matching '{wanted}' field")]
    MissingRateOrFactor { consumption: String, wanted: String },

    #[error("non-finite value in field '{field}' at row {row}")]
    UnboundedValue { field: String, row: usize },

    #[error("field '{field}' is not a {wanted} column")]
    WrongKind { field: String, wanted: &'static str },

    #[error("invalid bracket configuration: {reason}")]
    InvalidBrackets { reason: String },

    #[error("scale factor must be positive")]
    InvalidScale,

    #[error("negative geographic id in field '{field}' at row {row}")]
    NegativeKey { field: String, row: usize },

    #[error("coordinate file key '{key}' is not a numeric geographic id")]
    BadCoordinateKey { key: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AggResult<T> = Result<T, AggError>;
