//! The round-based convergence loop.
//!
//! [`Swarm`] drives a bounded sequence of rounds over a shared
//! [`RoundContext`]. Each cycle it first evaluates the termination policy
//! against the current context (so a context that already satisfies a stop
//! condition never runs a wasted round), then begins a round, invokes every
//! participant, and merges each contribution under the context's invariants.
//! If nobody contributes, the stall nudge bumps the confidence score so even
//! a pathological run drifts toward termination instead of spinning silently
//! until the cap.
//!
//! A participant failure is logged and treated as "did not contribute" for
//! that round; the loop itself only fails on invalid configuration.

use crate::context::RoundContext;
use crate::error::{QuorumError, Result};
use crate::participant::{Contribution, Participant};
use crate::swarm::events::{EventEmitter, SwarmEvent};
use crate::swarm::policy::{
    ExecutionMode, SwarmConfig, TerminationPolicy, TerminationReason, TerminationRule,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Final report of a swarm run.
///
/// Whatever progress accumulated is returned even when the run stopped early;
/// the reason always says why the loop ended.
#[derive(Debug)]
pub struct SwarmOutcome {
    /// The shared context in its final state
    pub context: RoundContext,
    /// How many rounds actually ran
    pub rounds_run: usize,
    /// Which termination rule stopped the run
    pub reason: TerminationReason,
}

impl SwarmOutcome {
    /// Total findings accumulated across all rounds
    pub fn total_findings(&self) -> usize {
        self.context.findings().len()
    }

    /// Whether the run ended because the collaboration converged, rather
    /// than by exhausting its round budget
    pub fn converged(&self) -> bool {
        matches!(
            self.reason,
            TerminationReason::ConfidenceThreshold | TerminationReason::Converged
        ) || self.context.is_converged()
    }
}

/// A bounded, observable collaboration loop over an ordered set of
/// participants.
///
/// # Examples
///
/// ```ignore
/// use quorum::swarm::Swarm;
/// use std::sync::Arc;
///
/// let swarm = Swarm::builder()
///     .participant(Arc::new(researcher))
///     .participant(Arc::new(analyst))
///     .participant(Arc::new(critic))
///     .max_rounds(10)
///     .build();
///
/// let outcome = swarm.run("How do container registries deduplicate layers?").await?;
/// println!("{} findings, stopped because {}", outcome.total_findings(), outcome.reason);
/// ```
pub struct Swarm {
    participants: Vec<Arc<dyn Participant>>,
    config: SwarmConfig,
    extra_rules: Vec<Box<dyn TerminationRule>>,
    /// The event emitter progress events are published through
    pub emitter: Arc<EventEmitter>,
}

impl Swarm {
    /// Create a swarm builder
    pub fn builder() -> SwarmBuilder {
        SwarmBuilder::new()
    }

    /// Execute the collaboration loop for a task.
    ///
    /// Validates the configuration, then runs rounds until the termination
    /// policy fires. Returns the final context and the reason the run
    /// stopped.
    ///
    /// # Errors
    ///
    /// Only configuration problems surface here; participant failures are
    /// contained within the loop.
    pub async fn run(&self, task: impl Into<String>) -> Result<SwarmOutcome> {
        self.config.validate()?;

        let policy = TerminationPolicy::assemble(&self.config, &self.extra_rules);
        let mut ctx = RoundContext::new(task, self.config.max_rounds);

        info!(
            run_id = %ctx.run_id(),
            task = ctx.task(),
            participants = self.participants.len(),
            mode = ?self.config.mode,
            "Starting swarm run"
        );

        let reason = loop {
            // Check before acting: a pre-satisfied context runs zero rounds.
            if let Some(reason) = policy.evaluate(&ctx) {
                break reason;
            }

            ctx.begin_round();
            debug!(
                run_id = %ctx.run_id(),
                round = ctx.round(),
                open_items = ctx.open_items().len(),
                findings = ctx.findings().len(),
                confidence = ctx.confidence(),
                "Round started"
            );
            self.emitter
                .emit(SwarmEvent::RoundStarted {
                    round: ctx.round(),
                    open_items: ctx.open_items().len(),
                    findings: ctx.findings().len(),
                    confidence: ctx.confidence(),
                })
                .await;

            let contributions = match self.config.mode {
                ExecutionMode::Sequential => self.run_round_sequential(&mut ctx).await,
                ExecutionMode::FanOut => self.run_round_fan_out(&mut ctx).await,
            };

            if contributions == 0 {
                ctx.adjust_confidence(self.config.stall_nudge);
                warn!(
                    run_id = %ctx.run_id(),
                    round = ctx.round(),
                    confidence = ctx.confidence(),
                    "No participant contributed; applying stall nudge"
                );
                self.emitter
                    .emit(SwarmEvent::StallNudged {
                        round: ctx.round(),
                        confidence: ctx.confidence(),
                    })
                    .await;
            }
        };

        info!(
            run_id = %ctx.run_id(),
            rounds = ctx.round(),
            findings = ctx.findings().len(),
            confidence = ctx.confidence(),
            reason = %reason,
            "Swarm run terminated"
        );
        self.emitter
            .emit(SwarmEvent::Terminated {
                round: ctx.round(),
                reason: reason.clone(),
            })
            .await;

        Ok(SwarmOutcome {
            rounds_run: ctx.round(),
            reason,
            context: ctx,
        })
    }

    /// Run one round with participants in strict order; each sees the merges
    /// of those that ran before it in the same round.
    async fn run_round_sequential(&self, ctx: &mut RoundContext) -> usize {
        let mut contributions = 0;
        for participant in &self.participants {
            let result = participant.contribute(ctx).await;
            if self.apply(ctx, participant.name(), result).await {
                contributions += 1;
            }
        }
        contributions
    }

    /// Run one round with all participants invoked concurrently against a
    /// snapshot of the context taken at round start, merging afterwards in
    /// configured order.
    async fn run_round_fan_out(&self, ctx: &mut RoundContext) -> usize {
        let snapshot = ctx.clone();
        let results =
            join_all(self.participants.iter().map(|p| p.contribute(&snapshot))).await;

        let mut contributions = 0;
        for (participant, result) in self.participants.iter().zip(results) {
            if self.apply(ctx, participant.name(), result).await {
                contributions += 1;
            }
        }
        contributions
    }

    /// Merge one participant's result into the context. Returns whether the
    /// participant contributed; failures and malformed contributions count
    /// as "did not contribute".
    async fn apply(
        &self,
        ctx: &mut RoundContext,
        name: &str,
        result: Result<Contribution>,
    ) -> bool {
        let contribution = match result.and_then(check_shape) {
            Ok(contribution) => contribution,
            Err(error) => {
                warn!(
                    run_id = %ctx.run_id(),
                    round = ctx.round(),
                    participant = name,
                    error = %error,
                    "Participant failed; treating as no contribution"
                );
                self.emitter
                    .emit(SwarmEvent::ParticipantFailed {
                        round: ctx.round(),
                        name: name.to_string(),
                        error: error.to_string(),
                    })
                    .await;
                return false;
            }
        };

        if !contribution.contributed {
            debug!(
                run_id = %ctx.run_id(),
                round = ctx.round(),
                participant = name,
                "Participant skipped this round"
            );
            self.emitter
                .emit(SwarmEvent::ParticipantSkipped {
                    round: ctx.round(),
                    name: name.to_string(),
                })
                .await;
            return false;
        }

        let findings = contribution.findings.len();
        let mut admitted = 0;
        for text in contribution.findings {
            ctx.record_finding(name, text);
        }
        for item in contribution.new_open_items {
            if ctx.add_open_item(item) {
                admitted += 1;
            }
        }
        for item in contribution.investigated {
            ctx.mark_investigated(item);
        }
        ctx.adjust_confidence(contribution.confidence_delta);
        if let Some(converged) = contribution.converged {
            ctx.set_converged(converged);
        }

        debug!(
            run_id = %ctx.run_id(),
            round = ctx.round(),
            participant = name,
            findings,
            new_open_items = admitted,
            confidence = ctx.confidence(),
            "Contribution merged"
        );
        self.emitter
            .emit(SwarmEvent::ParticipantContributed {
                round: ctx.round(),
                name: name.to_string(),
                findings,
                new_open_items: admitted,
                confidence_delta: contribution.confidence_delta,
            })
            .await;

        true
    }
}

/// Reject contributions that violate the contract shape.
fn check_shape(contribution: Contribution) -> Result<Contribution> {
    if !contribution.confidence_delta.is_finite() {
        return Err(QuorumError::MalformedContribution(format!(
            "confidence delta is {}",
            contribution.confidence_delta
        )));
    }
    Ok(contribution)
}

/// Builder for constructing a [`Swarm`] with custom configuration.
pub struct SwarmBuilder {
    participants: Vec<Arc<dyn Participant>>,
    config: SwarmConfig,
    extra_rules: Vec<Box<dyn TerminationRule>>,
}

impl SwarmBuilder {
    fn new() -> Self {
        Self {
            participants: Vec::new(),
            config: SwarmConfig::default(),
            extra_rules: Vec::new(),
        }
    }

    /// Append a participant; invocation order follows registration order
    pub fn participant(mut self, participant: Arc<dyn Participant>) -> Self {
        self.participants.push(participant);
        self
    }

    /// Replace the participant list
    pub fn participants(mut self, participants: Vec<Arc<dyn Participant>>) -> Self {
        self.participants = participants;
        self
    }

    /// Set the round cap (default: 10)
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.config.max_rounds = max_rounds;
        self
    }

    /// Set the confidence threshold (default: 0.85)
    pub fn convergence_threshold(mut self, threshold: f64) -> Self {
        self.config.convergence_threshold = threshold;
        self
    }

    /// Set the findings floor for the "all items investigated" rule
    /// (default: 3)
    pub fn min_findings_to_stop(mut self, min_findings: usize) -> Self {
        self.config.min_findings_to_stop = min_findings;
        self
    }

    /// Set the confidence increment applied on stalled rounds (default: 0.1)
    pub fn stall_nudge(mut self, nudge: f64) -> Self {
        self.config.stall_nudge = nudge;
        self
    }

    /// Set the intra-round execution mode (default: sequential)
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Append a termination rule, evaluated after the defaults and before
    /// the round cap
    pub fn termination_rule(mut self, rule: impl TerminationRule + 'static) -> Self {
        self.extra_rules.push(Box::new(rule));
        self
    }

    /// Build the swarm
    pub fn build(self) -> Swarm {
        Swarm {
            participants: self.participants,
            config: self.config,
            extra_rules: self.extra_rules,
            emitter: Arc::new(EventEmitter::new()),
        }
    }
}
