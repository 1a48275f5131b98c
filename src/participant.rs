//! The participant interface for collaboration loops.
//!
//! A participant is a unit of work that reads the shared [`RoundContext`]
//! once per round and returns a [`Contribution`]: the set of state deltas the
//! controller should merge on its behalf. Participants never mutate the
//! context directly; the controller applies their deltas so the context
//! invariants hold no matter what a participant returns.
//!
//! Participants typically wrap an external call (an LLM completion, a search
//! query). Those calls can fail; a participant that returns an error is
//! logged and treated as "did not contribute" for the round, so one degraded
//! participant never aborts the whole loop.

use crate::context::RoundContext;
use crate::error::Result;
use async_trait::async_trait;

/// State deltas produced by one participant in one round.
///
/// Findings are plain text here; the controller tags each with the
/// participant's name when merging it into the context. `investigated` lists
/// the open items the participant processed this round, which the controller
/// moves from the open list to the investigated list.
#[derive(Debug, Clone, Default)]
pub struct Contribution {
    /// Whether the participant did any work this round
    pub contributed: bool,
    /// New findings to append to the context
    pub findings: Vec<String>,
    /// New sub-questions to add to the open list (deduplicated on merge)
    pub new_open_items: Vec<String>,
    /// Open items this participant processed this round
    pub investigated: Vec<String>,
    /// Adjustment to the confidence score; may be negative
    pub confidence_delta: f64,
    /// Convergence judgement, if this participant makes one
    pub converged: Option<bool>,
}

impl Contribution {
    /// A no-op contribution, for rounds where the participant's
    /// preconditions were not met.
    pub fn none() -> Self {
        Self::default()
    }

    /// Start a contribution that did do work this round
    pub fn new() -> Self {
        Self {
            contributed: true,
            ..Self::default()
        }
    }

    /// Append a finding
    pub fn with_finding(mut self, text: impl Into<String>) -> Self {
        self.findings.push(text.into());
        self
    }

    /// Append a new open item
    pub fn with_open_item(mut self, item: impl Into<String>) -> Self {
        self.new_open_items.push(item.into());
        self
    }

    /// Claim an open item as investigated
    pub fn with_investigated(mut self, item: impl Into<String>) -> Self {
        self.investigated.push(item.into());
        self
    }

    /// Set the confidence adjustment
    pub fn with_confidence_delta(mut self, delta: f64) -> Self {
        self.confidence_delta = delta;
        self
    }

    /// Set the convergence judgement
    pub fn with_converged(mut self, converged: bool) -> Self {
        self.converged = Some(converged);
        self
    }
}

/// A unit of work that may contribute to the shared context once per round.
///
/// # Examples
///
/// ```
/// use quorum::context::RoundContext;
/// use quorum::participant::{Contribution, Participant};
/// use quorum::Result;
/// use async_trait::async_trait;
///
/// struct Encourager;
///
/// #[async_trait]
/// impl Participant for Encourager {
///     fn name(&self) -> &str {
///         "encourager"
///     }
///
///     async fn contribute(&self, _ctx: &RoundContext) -> Result<Contribution> {
///         Ok(Contribution::new().with_confidence_delta(0.1))
///     }
/// }
/// ```
#[async_trait]
pub trait Participant: Send + Sync {
    /// Name used to tag this participant's findings and log lines
    fn name(&self) -> &str;

    /// Read the shared context and produce this round's state deltas.
    ///
    /// Implementations should return `Contribution::none()` when their
    /// preconditions are unmet (for example, not enough findings to analyse
    /// yet) rather than fabricating work.
    async fn contribute(&self, ctx: &RoundContext) -> Result<Contribution>;
}
