//! Error types for the manzai script generator.
//!
//! This crate provides the foundation error types used throughout the manzai workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use manzai_error::{ManzaiResult, ValidationError, ValidationErrorKind};
//!
//! fn require_theme(theme: &str) -> ManzaiResult<&str> {
//!     if theme.trim().is_empty() {
//!         Err(ValidationError::new(ValidationErrorKind::MissingField("theme".into())))?
//!     }
//!     Ok(theme)
//! }
//!
//! assert!(require_theme("回転寿司").is_ok());
//! assert!(require_theme(" ").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generation;
mod ledger;
mod server;
mod validation;

pub use config::ConfigError;
pub use error::{ManzaiError, ManzaiErrorKind, ManzaiResult};
pub use generation::{GenerationError, GenerationErrorKind, GenerationResult};
pub use ledger::{LedgerError, LedgerErrorKind, LedgerResult};
pub use server::{ServerError, ServerErrorKind};
pub use validation::{ValidationError, ValidationErrorKind, ValidationResult};
