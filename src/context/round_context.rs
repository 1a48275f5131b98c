//! Shared round context for collaboration loops.
//!
//! This module provides [`RoundContext`], the mutable record shared by all
//! participants within one collaboration run. The context collects tagged
//! findings, tracks which sub-questions are still open, and accumulates a
//! confidence score that the termination policy evaluates after every round.
//!
//! All mutation goes through methods that preserve the context invariants:
//! findings are append-only, open and investigated items stay disjoint, the
//! confidence score never drops below zero, and the round counter only moves
//! forward.
//!
//! # Examples
//!
//! ```
//! use quorum::context::RoundContext;
//!
//! let mut ctx = RoundContext::new("Why did the deploy fail?", 5);
//!
//! ctx.add_open_item("Check the rollout logs");
//! ctx.record_finding("researcher", "The canary pods never became ready");
//! ctx.adjust_confidence(0.3);
//!
//! assert_eq!(ctx.open_items().len(), 1);
//! assert_eq!(ctx.findings().len(), 1);
//! assert_eq!(ctx.confidence(), 0.3);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single tagged entry in the accumulated findings log.
///
/// The tag identifies the participant that contributed the entry, so later
/// participants (and the final synthesis step) can see who said what.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Name of the contributing participant
    pub tag: String,
    /// The finding text
    pub text: String,
    /// When the finding was merged into the context
    pub recorded_at: DateTime<Utc>,
}

impl Finding {
    /// Create a new finding stamped with the current time
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Mutable state shared across all participants within one collaboration run.
///
/// The context is created once per run, mutated in place by the controller as
/// it merges participant contributions, and handed back inside the run's
/// outcome. It is not persisted across runs.
///
/// Fields are private; mutation happens through methods that uphold the
/// invariants documented on each method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundContext {
    task: String,
    run_id: Uuid,
    findings: Vec<Finding>,
    open_items: Vec<String>,
    investigated: Vec<String>,
    confidence: f64,
    round: usize,
    max_rounds: usize,
    converged: bool,
}

impl RoundContext {
    /// Create a fresh context for a task.
    ///
    /// The context starts at round 0 with empty collections and zero
    /// confidence.
    ///
    /// # Arguments
    ///
    /// * `task` - The goal of the run; immutable once set
    /// * `max_rounds` - The configured round bound
    pub fn new(task: impl Into<String>, max_rounds: usize) -> Self {
        Self {
            task: task.into(),
            run_id: Uuid::new_v4(),
            findings: Vec::new(),
            open_items: Vec::new(),
            investigated: Vec::new(),
            confidence: 0.0,
            round: 0,
            max_rounds,
            converged: false,
        }
    }

    /// The task description this run is working on
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Unique identifier for this run, carried through events and log fields
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// All findings merged so far, in contribution order
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Sub-questions not yet investigated, in arrival order
    pub fn open_items(&self) -> &[String] {
        &self.open_items
    }

    /// Sub-questions that have already been processed
    pub fn investigated(&self) -> &[String] {
        &self.investigated
    }

    /// Current confidence score; never negative
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Rounds begun so far
    pub fn round(&self) -> usize {
        self.round
    }

    /// The configured round bound
    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Whether a participant has judged the latest contribution acceptable
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Append a finding tagged with the contributing participant's name.
    ///
    /// The findings log is append-only; nothing ever truncates or reorders it.
    pub fn record_finding(&mut self, tag: impl Into<String>, text: impl Into<String>) {
        self.findings.push(Finding::new(tag, text));
    }

    /// Add a sub-question to the open list, deduplicating against both the
    /// open and the already-investigated items.
    ///
    /// Returns `true` if the item was admitted, `false` if it was a duplicate.
    pub fn add_open_item(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if self.open_items.contains(&item) || self.investigated.contains(&item) {
            return false;
        }
        self.open_items.push(item);
        true
    }

    /// Move an item from the open list to the investigated list.
    ///
    /// The item is removed from `open_items` if present and recorded as
    /// investigated if it was not already, so the two collections stay
    /// disjoint. Items never leave the investigated list.
    pub fn mark_investigated(&mut self, item: impl Into<String>) {
        let item = item.into();
        self.open_items.retain(|existing| existing != &item);
        if !self.investigated.contains(&item) {
            self.investigated.push(item);
        }
    }

    /// Apply a confidence adjustment, clamping the result at zero.
    pub fn adjust_confidence(&mut self, delta: f64) {
        self.confidence = (self.confidence + delta).max(0.0);
    }

    /// Begin the next round, incrementing the round counter by exactly one.
    pub fn begin_round(&mut self) {
        self.round += 1;
    }

    /// Record a participant's convergence judgement
    pub fn set_converged(&mut self, converged: bool) {
        self.converged = converged;
    }

    /// Render the last `limit` findings as one text block, oldest first.
    ///
    /// Participants that reason over recent findings (and the synthesis step,
    /// with `limit` covering everything) use this to build prompts.
    pub fn recent_findings_text(&self, limit: usize) -> String {
        let start = self.findings.len().saturating_sub(limit);
        self.findings[start..]
            .iter()
            .map(|f| format!("[{}] {}", f.tag.to_uppercase(), f.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
