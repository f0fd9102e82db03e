//! Error types for schema construction and frame transforms.

/// Schema construction and request validation errors.
///
/// Raised for malformed construction input and for transform requests that
/// reference names or values the schema never declared.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigurationError {
    #[error("feature mapping is empty")]
    EmptyFeatures,

    #[error("outcome name is empty")]
    EmptyOutcome,

    #[error("outcome '{0}' is also declared as a feature")]
    OutcomeIsFeature(String),

    #[error("feature '{0}' is declared more than once")]
    DuplicateFeature(String),

    #[error("continuous feature '{feature}' has invalid range [{min}, {max}]: bounds must be finite with min < max")]
    InvalidRange {
        feature: String,
        min: f64,
        max: f64,
    },

    #[error("categorical feature '{0}' declares no levels")]
    EmptyLevels(String),

    #[error("categorical feature '{feature}' declares level '{level}' more than once")]
    DuplicateLevel { feature: String, level: String },

    #[error("encoded column '{0}' is produced by more than one feature declaration")]
    EncodedNameClash(String),

    #[error("unknown feature name: {0}")]
    UnknownFeature(String),

    #[error("precision declared for categorical feature '{0}'")]
    PrecisionOnCategorical(String),

    #[error("mad list has {got} entries, expected one per declared feature ({expected})")]
    MadLength { expected: usize, got: usize },

    #[error("query row has {got} values, expected {expected}")]
    QueryLength { expected: usize, got: usize },

    #[error("feature '{feature}' expects a {expected} value")]
    QueryType {
        feature: String,
        expected: &'static str,
    },

    #[error("'{level}' is not a declared level of feature '{feature}'")]
    UnknownLevel { feature: String, level: String },
}

/// Structural errors on [`Frame`](crate::frame::Frame) operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FrameError {
    #[error("column '{column}' has {got} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("column '{0}' does not have the expected type")]
    ColumnTypeMismatch(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("matrix has {got} columns, expected {expected}")]
    ShapeMismatch { expected: usize, got: usize },
}

/// The requested operation is not available for a metadata-only schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot derive development data from metadata alone: this schema carries no dataset")]
pub struct UnsupportedError;
