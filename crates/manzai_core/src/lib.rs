//! Core data types for the manzai script generator.
//!
//! This crate provides the data model shared by every stage of the pipeline:
//! the validated caller request, the per-request prompt plan, the script
//! draft threaded through shaping, the usage ledger records, and the
//! model-facing chat request/response types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod characters;
mod draft;
mod message;
mod plan;
mod policy;
mod request;
mod role;
mod script_request;
mod usage;

pub use characters::{
    Characters, DEFAULT_BOKE, DEFAULT_TSUKKOMI, MAX_CHARACTERS, MAX_NAME_CHARS, MIN_CHARACTERS,
};
pub use draft::{DEFAULT_TITLE, ScriptDraft};
pub use message::Message;
pub use plan::{InstructionPayload, PromptPlan};
pub use policy::{
    CountUnit, CountingPolicy, LengthBounds, LengthPolicy, LengthRules, MeteringPolicy,
    OutOfRange,
};
pub use request::{
    GenerateRequest, GenerateRequestBuilder, GenerateRequestBuilderError, GenerateResponse,
    TokenUsage,
};
pub use role::Role;
pub use script_request::{
    GenerationRequest, GenerationRequestInput, LengthValue, MAX_THEME_CHARS, TechniqueSelections,
    UserKey,
};
pub use usage::{ConsumedFrom, LedgerState, UsageRecord, UsageSnapshot};
