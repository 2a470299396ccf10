use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("No ingestor found for file: {0}")]
    NoIngestor(String),

    #[error("Parsed rows missing required fields: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid amount: {value:?}")]
    InvalidAmount { value: String },

    #[error("Invalid date: {value:?}")]
    InvalidDate { value: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
