//! Request-level failures and their HTTP rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use manzai_core::UsageSnapshot;
use manzai_error::{GenerationError, LedgerError, ValidationError};
use serde::{Deserialize, Serialize};

/// Why a request ended without a result.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum PipelineError {
    /// Missing or malformed request fields
    #[display("{}", _0.kind)]
    #[from]
    Validation(ValidationError),

    /// Body could not be read as JSON of the expected shape
    #[display("{}", _0)]
    BadRequest(String),

    /// The ledger gate denied the request
    #[display("Usage quota exhausted")]
    QuotaExhausted {
        /// Counters at the time of the check
        usage: Option<UsageSnapshot>,
    },

    /// The generation backend failed
    #[display("{}", _0.kind)]
    #[from]
    Generation(GenerationError),

    /// The usage store could not be read or written
    #[display("{}", _0.kind)]
    #[from]
    Ledger(LedgerError),

    /// Shaping left nothing to return
    #[display("Generation produced an empty script")]
    EmptyScript,

    /// Wrong HTTP method for the route
    #[display("Method not allowed")]
    MethodNotAllowed,
}

impl std::error::Error for PipelineError {}

impl PipelineError {
    /// HTTP status for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::Validation(_) | PipelineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::QuotaExhausted { .. } => StatusCode::FORBIDDEN,
            PipelineError::Generation(e) => StatusCode::from_u16(e.kind.status_hint())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            PipelineError::Ledger(_) | PipelineError::EmptyScript => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PipelineError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::BadRequest(_) => "bad_request",
            PipelineError::QuotaExhausted { .. } => "quota_exhausted",
            PipelineError::Generation(_) => "generation_failed",
            PipelineError::Ledger(_) => "ledger_unavailable",
            PipelineError::EmptyScript => "empty_script",
            PipelineError::MethodNotAllowed => "method_not_allowed",
        }
    }

    /// Response body. Provider detail is attached only outside production.
    pub fn body(&self, production: bool) -> ErrorBody {
        let usage = match self {
            PipelineError::QuotaExhausted { usage } => usage.clone(),
            _ => None,
        };
        let detail = match self {
            PipelineError::Generation(e) if !production => Some(ErrorDetail {
                code: e.kind.code().to_string(),
                status_hint: e.kind.status_hint(),
                message: e.kind.to_string(),
                provider_detail: e.kind.provider_detail().map(str::to_string),
            }),
            _ => None,
        };
        let message = match self {
            PipelineError::Ledger(_) if production => "Usage ledger is unavailable".to_string(),
            other => other.to_string(),
        };
        ErrorBody {
            error: self.kind().to_string(),
            message,
            usage,
            detail,
        }
    }

    /// Render as an HTTP response.
    pub fn into_response_for(self, production: bool) -> Response {
        (self.status(), Json(self.body(production))).into_response()
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        self.into_response_for(true)
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error kind
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Counters, for quota denials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSnapshot>,
    /// Classified generation failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ErrorDetail>,
}

/// Classified generation failure, for non-production deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Failure class (e.g., "timeout", "rate_limit")
    pub code: String,
    /// Suggested HTTP status
    pub status_hint: u16,
    /// Failure description
    pub message: String,
    /// Raw provider body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use manzai_error::{GenerationErrorKind, LedgerErrorKind, ValidationErrorKind};

    #[test]
    fn test_generation_status_follows_hint() {
        let upstream = PipelineError::from(GenerationError::new(GenerationErrorKind::Timeout {
            seconds: 60,
        }));
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let local = PipelineError::from(GenerationError::new(GenerationErrorKind::MissingApiKey));
        assert_eq!(local.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_detail_hidden_in_production() {
        let err = PipelineError::from(GenerationError::new(GenerationErrorKind::Api {
            status: 500,
            message: "Internal Server Error".into(),
            detail: Some("{\"error\":\"boom\"}".into()),
        }));

        let open = err.body(false);
        let detail = open.detail.expect("detail outside production");
        assert_eq!(detail.code, "provider_error");
        assert_eq!(detail.provider_detail.as_deref(), Some("{\"error\":\"boom\"}"));

        assert!(err.body(true).detail.is_none());
    }

    #[test]
    fn test_message_omits_source_location() {
        let err = PipelineError::from(ValidationError::new(ValidationErrorKind::MissingField(
            "theme".into(),
        )));
        let body = err.body(false);
        assert_eq!(body.error, "validation");
        assert_eq!(body.message, "Missing required field: theme");
    }

    #[test]
    fn test_ledger_message_generic_in_production() {
        let err = PipelineError::from(LedgerError::new(LedgerErrorKind::Read("disk".into())));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(true).message, "Usage ledger is unavailable");
        assert!(err.body(false).message.contains("disk"));
    }
}
