//! Stock participants for investigation swarms.
//!
//! These are ready-made [`Participant`] implementations covering the common
//! investigation roles: a researcher that works through open items with the
//! search collaborator, an analyst that looks for patterns across findings,
//! and a critic that challenges weak claims. [`Synthesizer`] is not a
//! participant; it turns the finished context into a final answer after the
//! loop terminates.
//!
//! All roles speak to external services exclusively through the collaborator
//! traits in [`crate::llm`], asking for structured JSON contributions with
//! schemas derived from the report types in each module.
//!
//! [`Participant`]: crate::participant::Participant
//! [`Synthesizer`]: synthesizer::Synthesizer

pub mod analyst;
pub mod critic;
pub mod researcher;
pub mod synthesizer;

pub use analyst::Analyst;
pub use critic::Critic;
pub use researcher::Researcher;
pub use synthesizer::Synthesizer;
