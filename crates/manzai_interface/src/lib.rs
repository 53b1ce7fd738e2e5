//! Trait definitions for the manzai script generator.
//!
//! The pipeline talks to two external collaborators: a text-generation
//! backend and a key-value store holding usage records. Both sit behind
//! the traits in this crate so the orchestrator can be exercised against
//! in-process doubles.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{GenerationClient, UsageStore};
