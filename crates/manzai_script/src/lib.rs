//! Deterministic shaping of generated scripts.
//!
//! Generation backends cannot be trusted to hit a character budget or to
//! format dialogue consistently. This crate holds the pure, idempotent passes
//! that turn raw model output into a script that honours the length contract:
//!
//! - [`CharacterCounter`] measures text under a [`CountingPolicy`](manzai_core::CountingPolicy)
//! - [`TextNormalizer`] splits title from body and fixes speaker labels,
//!   turn spacing and the closing line
//! - [`LengthEnforcer`] strips markup and truncates at safe boundaries
//! - [`ScriptShaper`] chains the three the way the request pipeline needs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod counter;
mod enforcer;
mod normalizer;
mod shaper;

pub use counter::{CharacterCounter, count};
pub use enforcer::{
    DEFAULT_SOFT_CUT_RATIO, DEFAULT_TERMINAL, EnforcerConfig, LengthEnforcer, SENTENCE_FINAL,
    ends_with_terminal,
};
pub use normalizer::{CLOSING_PHRASE, TextNormalizer};
pub use shaper::{DEFAULT_DEFICIT_THRESHOLD, ScriptShaper};
