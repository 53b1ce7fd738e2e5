//! Prompt assembly for the manzai script generator.
//!
//! The [`TechniqueCatalog`] is static configuration data bundled with the
//! crate. The [`PromptAssembler`] maps a validated request onto an opaque
//! instruction payload plus the [`PromptPlan`](manzai_core::PromptPlan)
//! metadata the shaping stages need. Randomised technique fallback goes
//! through a [`RandomSource`] so tests can pin it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod catalog;
mod random;

pub use assembler::{FallbackSizes, PromptAssembler, PromptSettings, SYSTEM_PROMPT};
pub use catalog::{Namespace, Technique, TechniqueCatalog};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
