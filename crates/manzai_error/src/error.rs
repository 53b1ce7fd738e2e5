//! Top-level error wrapper types.

use crate::{ConfigError, GenerationError, LedgerError, ServerError, ValidationError};

/// Every error condition a manzai crate can surface.
///
/// # Examples
///
/// ```
/// use manzai_error::{ManzaiError, ManzaiErrorKind, ConfigError};
///
/// let err: ManzaiError = ConfigError::new("hard_ceiling must be positive").into();
/// assert!(matches!(err.kind(), ManzaiErrorKind::Config(_)));
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ManzaiErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Request validation error
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Generation backend error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Usage ledger error
    #[from(LedgerError)]
    Ledger(LedgerError),
    /// HTTP service lifecycle error
    #[from(ServerError)]
    Server(ServerError),
}

/// Manzai error with kind discrimination.
///
/// # Examples
///
/// ```
/// use manzai_error::{ManzaiResult, ConfigError};
///
/// fn might_fail() -> ManzaiResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Manzai Error: {}", _0)]
pub struct ManzaiError(Box<ManzaiErrorKind>);

impl ManzaiError {
    /// Create a new error from a kind.
    pub fn new(kind: ManzaiErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ManzaiErrorKind {
        &self.0
    }

    /// Consume the wrapper and return the kind.
    pub fn into_kind(self) -> ManzaiErrorKind {
        *self.0
    }
}

// Generic From implementation for any type that converts to ManzaiErrorKind
impl<T> From<T> for ManzaiError
where
    T: Into<ManzaiErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for manzai operations.
pub type ManzaiResult<T> = std::result::Result<T, ManzaiError>;
