//! Generation backend errors and their classification.

/// Generation backend failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GenerationErrorKind {
    /// No API key configured for the provider
    #[display("No API key configured for the generation backend")]
    MissingApiKey,

    /// Transport failure before a response arrived
    #[display("HTTP request failed: {}", _0)]
    Http(String),

    /// Provider answered with a non-success status
    #[display("Provider returned HTTP {}: {}", status, message)]
    Api {
        /// HTTP status returned by the provider
        status: u16,
        /// Short message
        message: String,
        /// Raw provider body, if any
        detail: Option<String>,
    },

    /// Provider rejected the request for quota or rate reasons
    #[display("Provider rate limit exceeded")]
    RateLimited {
        /// Raw provider body, if any
        detail: Option<String>,
    },

    /// No response within the configured bound
    #[display("Generation timed out after {}s", seconds)]
    Timeout {
        /// Configured timeout in seconds
        seconds: u64,
    },

    /// Provider answered successfully but without any text
    #[display("Generation backend returned empty output")]
    EmptyOutput,

    /// Response body could not be decoded
    #[display("Failed to parse provider response: {}", _0)]
    ResponseParsing(String),

    /// Request could not be built
    #[display("Invalid generation request: {}", _0)]
    InvalidRequest(String),
}

impl GenerationErrorKind {
    /// HTTP status the service should answer with for this failure.
    ///
    /// Upstream faults map to 502, local faults to 500.
    pub fn status_hint(&self) -> u16 {
        match self {
            GenerationErrorKind::Http(_)
            | GenerationErrorKind::Api { .. }
            | GenerationErrorKind::RateLimited { .. }
            | GenerationErrorKind::Timeout { .. }
            | GenerationErrorKind::ResponseParsing(_) => 502,
            GenerationErrorKind::MissingApiKey
            | GenerationErrorKind::EmptyOutput
            | GenerationErrorKind::InvalidRequest(_) => 500,
        }
    }

    /// Machine-readable classification label.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationErrorKind::MissingApiKey => "configuration",
            GenerationErrorKind::Http(_) => "network",
            GenerationErrorKind::Api { .. } => "provider_error",
            GenerationErrorKind::RateLimited { .. } => "rate_limit",
            GenerationErrorKind::Timeout { .. } => "timeout",
            GenerationErrorKind::EmptyOutput => "empty_output",
            GenerationErrorKind::ResponseParsing(_) => "invalid_response",
            GenerationErrorKind::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Raw provider body, when the provider sent one.
    pub fn provider_detail(&self) -> Option<&str> {
        match self {
            GenerationErrorKind::Api { detail, .. }
            | GenerationErrorKind::RateLimited { detail } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Generation error with location tracking.
///
/// # Examples
///
/// ```
/// use manzai_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::Timeout { seconds: 60 });
/// assert_eq!(err.kind.status_hint(), 502);
/// assert_eq!(err.kind.code(), "timeout");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The specific error kind
    pub kind: GenerationErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// Source file where error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new generation error.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GenerationErrorKind {
        &self.kind
    }
}

/// Result type for generation calls.
pub type GenerationResult<T> = Result<T, GenerationError>;
