//! Usage ledger error types.

/// Kinds of ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum LedgerErrorKind {
    /// Failed to read a usage record
    #[display("Failed to read usage record: {}", _0)]
    Read(String),
    /// Failed to write a usage record
    #[display("Failed to write usage record: {}", _0)]
    Write(String),
    /// Stored record could not be encoded or decoded
    #[display("Usage record serialization failed: {}", _0)]
    Serialization(String),
    /// User key unusable as a ledger key
    #[display("Invalid user key: {}", _0)]
    InvalidKey(String),
    /// Top-up amount not understood
    #[display("Invalid credit delta: {}", _0)]
    InvalidDelta(String),
    /// Backing store is unavailable
    #[display("Usage store unavailable: {}", _0)]
    Unavailable(String),
}

/// Ledger error with location tracking.
///
/// # Examples
///
/// ```
/// use manzai_error::{LedgerError, LedgerErrorKind};
///
/// let err = LedgerError::new(LedgerErrorKind::Unavailable("store offline".to_string()));
/// assert!(format!("{}", err).contains("unavailable"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Ledger Error: {} at line {} in {}", kind, line, file)]
pub struct LedgerError {
    /// The kind of error that occurred
    pub kind: LedgerErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl LedgerError {
    /// Create a new ledger error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: LedgerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &LedgerErrorKind {
        &self.kind
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
