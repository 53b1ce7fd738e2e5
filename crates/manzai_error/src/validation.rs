//! Request validation errors.

/// Specific validation failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Required field missing from the request
    #[display("Missing required field: {}", _0)]
    MissingField(String),

    /// Field present but with the wrong shape or value
    #[display("Invalid field value for '{}': {}", field, reason)]
    InvalidField {
        /// The field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Fewer speakers than a dialogue needs
    #[display("At least {} characters are required, got {}", min, got)]
    TooFewCharacters {
        /// Minimum accepted
        min: usize,
        /// Number supplied
        got: usize,
    },

    /// More speakers than the generator supports
    #[display("At most {} characters are allowed, got {}", max, got)]
    TooManyCharacters {
        /// Maximum accepted
        max: usize,
        /// Number supplied
        got: usize,
    },

    /// Requested length outside the accepted range
    #[display("Length {} is outside [1, {}]", requested, ceiling)]
    LengthOutOfRange {
        /// Length the caller asked for
        requested: i64,
        /// Configured ceiling
        ceiling: u32,
    },
}

/// Validation error with location tracking.
///
/// # Examples
///
/// ```
/// use manzai_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::MissingField("theme".into()));
/// assert!(format!("{}", err).contains("theme"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The specific error kind
    pub kind: ValidationErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// Source file where error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new validation error.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ValidationErrorKind {
        &self.kind
    }
}

/// Result type for request validation.
pub type ValidationResult<T> = Result<T, ValidationError>;
