use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Missing required column '{column}' (accepted headers: {accepted})")]
    SchemaError { column: String, accepted: String },

    #[error("Row {row}: cannot parse {field} value '{value}'")]
    FormatError {
        row: usize,
        field: String,
        value: String,
    },

    #[error("Forecast failed: {0}")]
    ForecastError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
