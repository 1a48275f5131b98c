//! The convergence loop controller.
//!
//! This module implements the round-based collaboration loop: a bounded,
//! observable sequence of rounds over a shared [`RoundContext`], where each
//! round invokes every configured [`Participant`], merges its contribution,
//! and then evaluates an ordered termination policy.
//!
//! [`RoundContext`]: crate::context::RoundContext
//! [`Participant`]: crate::participant::Participant

pub mod controller;
pub mod events;
pub mod policy;

pub use controller::{Swarm, SwarmBuilder, SwarmOutcome};
pub use events::{EventEmitter, SwarmEvent};
pub use policy::{
    ConfidenceThresholdRule, ConvergedRule, ExecutionMode, ItemsExhaustedRule, RoundCapRule,
    SwarmConfig, TerminationReason, TerminationRule,
};
