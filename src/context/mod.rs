//! Context management for collaboration loops.
//!
//! This module provides the shared round context that participants read from
//! and contribute to across the rounds of a collaboration run.

pub mod round_context;

pub use round_context::{Finding, RoundContext};
