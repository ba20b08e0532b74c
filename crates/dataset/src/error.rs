use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to open dataset '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: required column '{column}' is missing (found: {available})")]
    MissingColumn {
        column: &'static str,
        available: String,
    },

    #[error("Invalid value on line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    #[error("Record rejected on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: core_types::CoreError,
    },

    #[error("Cannot impute missing '{0}' values: no observed values to derive them from")]
    NoUsableValues(&'static str),
}
