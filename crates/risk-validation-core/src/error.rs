use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskValidationError {
    #[error("Empty dataset: no observations to test")]
    EmptyDataset,

    #[error("Unknown column: '{column}' is not in the dataset")]
    UnknownColumn { column: String },

    #[error("Column '{column}' has the wrong type: expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("Missing values in column '{column}'")]
    MissingValues { column: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Rating categories differ between '{initial_column}' and '{final_column}'")]
    CategoryMismatch {
        initial_column: String,
        final_column: String,
    },

    #[error("Bucket '{bucket}' carries more than one distinct predicted PD")]
    InconsistentBucket { bucket: String },

    #[error("Numeric failure in {context}")]
    Numeric { context: String },
}
