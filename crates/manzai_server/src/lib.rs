//! Request orchestration and HTTP service for the manzai script generator.
//!
//! A request flows through one pipeline:
//!
//! ```text
//! validate → ledger gate → prompt → generate → first pass
//!          → continuation (optional) → length enforcement → debit → respond
//! ```
//!
//! [`RequestOrchestrator`] owns that flow and is built from an explicit
//! [`ManzaiConfig`] plus injected collaborators, so tests can swap in mock
//! clients and stores. [`create_router`] exposes it over HTTP with axum.
//!
//! # Example
//!
//! ```rust,no_run
//! use manzai_server::{ManzaiConfig, build_app, serve};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ManzaiConfig::load(None)?;
//! let app = build_app(&config)?;
//! serve(app, &config).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod config;
mod continuation;
mod error;
mod generator;
mod observability;
mod orchestrator;
mod server;

pub use api::{ApiState, create_router};
pub use config::{
    LengthPolicyKind, LengthSettings, ManzaiConfig, MeteringKind, MeteringSettings,
    ModelSettings, OPENAI_API_KEY_VAR, ServerSettings, StoreKind, TechniqueSettings,
};
pub use continuation::ContinuationController;
pub use error::{ErrorBody, ErrorDetail, PipelineError};
pub use generator::Generator;
pub use observability::{init_logging, log_filter};
pub use orchestrator::{GeneratedScript, RequestOrchestrator, ScriptMeta};
pub use server::{build_app, build_store, serve};
