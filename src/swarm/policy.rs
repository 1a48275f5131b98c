//! Loop configuration and the ordered termination policy.
//!
//! Termination is decided by an explicit list of [`TerminationRule`]s
//! evaluated in fixed priority order at the top of every cycle; the first
//! rule that fires names the reason the run stopped. The round cap is always
//! the last rule in the list and can never be removed, so every run halts.

use crate::context::RoundContext;
use crate::error::{QuorumError, Result};
use std::fmt;

/// Why a collaboration run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The round cap was hit
    MaxRoundsReached,
    /// The accumulated confidence score crossed the configured threshold
    ConfidenceThreshold,
    /// No open items remain and enough findings have accumulated
    AllItemsInvestigated,
    /// A participant judged the latest contribution acceptable
    Converged,
    /// A caller-supplied rule fired
    Custom(String),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::MaxRoundsReached => write!(f, "max rounds reached"),
            TerminationReason::ConfidenceThreshold => write!(f, "confidence threshold reached"),
            TerminationReason::AllItemsInvestigated => write!(f, "all open items investigated"),
            TerminationReason::Converged => write!(f, "converged"),
            TerminationReason::Custom(reason) => write!(f, "{}", reason),
        }
    }
}

/// How participants execute within a round.
///
/// `Sequential` runs participants strictly in configured order, each seeing
/// the merges of those that ran earlier in the same round. `FanOut` runs all
/// participants concurrently against a snapshot of the context taken at round
/// start, then merges every contribution afterwards in configured order; it
/// trades the intra-round dependency guarantee for throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    FanOut,
}

/// Configuration for a swarm run.
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    /// Hard bound on the number of rounds
    pub max_rounds: usize,
    /// Confidence score at which the run stops
    pub convergence_threshold: f64,
    /// Minimum findings required before "all items investigated" may fire
    pub min_findings_to_stop: usize,
    /// Confidence increment applied when no participant contributes in a round
    pub stall_nudge: f64,
    /// Intra-round execution mode
    pub mode: ExecutionMode,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            convergence_threshold: 0.85,
            min_findings_to_stop: 3,
            stall_nudge: 0.1,
            mode: ExecutionMode::Sequential,
        }
    }
}

impl SwarmConfig {
    /// Check the configuration before a run starts.
    ///
    /// Invalid values are an error, never silently clamped.
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(QuorumError::ConfigError("max_rounds must be at least 1".to_string()));
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold <= 0.0 {
            return Err(QuorumError::ConfigError(format!(
                "convergence_threshold must be a positive finite number, got {}",
                self.convergence_threshold
            )));
        }
        if !self.stall_nudge.is_finite() || self.stall_nudge <= 0.0 {
            return Err(QuorumError::ConfigError(format!(
                "stall_nudge must be a positive finite number, got {}",
                self.stall_nudge
            )));
        }
        Ok(())
    }
}

/// One predicate in the ordered termination policy.
///
/// Returning `Some(reason)` stops the run; `None` passes evaluation to the
/// next rule in the list.
pub trait TerminationRule: Send + Sync {
    fn evaluate(&self, ctx: &RoundContext) -> Option<TerminationReason>;
}

impl<F> TerminationRule for F
where
    F: Fn(&RoundContext) -> Option<TerminationReason> + Send + Sync,
{
    fn evaluate(&self, ctx: &RoundContext) -> Option<TerminationReason> {
        self(ctx)
    }
}

/// Fires once the confidence score crosses the configured threshold.
pub struct ConfidenceThresholdRule {
    pub threshold: f64,
}

impl TerminationRule for ConfidenceThresholdRule {
    fn evaluate(&self, ctx: &RoundContext) -> Option<TerminationReason> {
        (ctx.confidence() >= self.threshold).then_some(TerminationReason::ConfidenceThreshold)
    }
}

/// Fires when no open items remain and the findings log has grown past the
/// configured minimum.
pub struct ItemsExhaustedRule {
    pub min_findings: usize,
}

impl TerminationRule for ItemsExhaustedRule {
    fn evaluate(&self, ctx: &RoundContext) -> Option<TerminationReason> {
        (ctx.open_items().is_empty() && ctx.findings().len() > self.min_findings)
            .then_some(TerminationReason::AllItemsInvestigated)
    }
}

/// Fires once a participant has set the context's convergence flag.
pub struct ConvergedRule;

impl TerminationRule for ConvergedRule {
    fn evaluate(&self, ctx: &RoundContext) -> Option<TerminationReason> {
        ctx.is_converged().then_some(TerminationReason::Converged)
    }
}

/// The round cap. Always evaluated last; the one guarantee against an
/// unbounded run, so every assembled policy includes it unconditionally.
pub struct RoundCapRule;

impl TerminationRule for RoundCapRule {
    fn evaluate(&self, ctx: &RoundContext) -> Option<TerminationReason> {
        (ctx.round() >= ctx.max_rounds()).then_some(TerminationReason::MaxRoundsReached)
    }
}

/// Ordered termination policy: configured defaults first, then the
/// caller-supplied rules, then the round cap. First hit wins.
pub(crate) struct TerminationPolicy<'a> {
    defaults: Vec<Box<dyn TerminationRule>>,
    extras: &'a [Box<dyn TerminationRule>],
}

impl<'a> TerminationPolicy<'a> {
    pub(crate) fn assemble(
        config: &SwarmConfig,
        extras: &'a [Box<dyn TerminationRule>],
    ) -> Self {
        let defaults: Vec<Box<dyn TerminationRule>> = vec![
            Box::new(ConfidenceThresholdRule {
                threshold: config.convergence_threshold,
            }),
            Box::new(ItemsExhaustedRule {
                min_findings: config.min_findings_to_stop,
            }),
        ];
        Self { defaults, extras }
    }

    pub(crate) fn evaluate(&self, ctx: &RoundContext) -> Option<TerminationReason> {
        self.defaults
            .iter()
            .find_map(|rule| rule.evaluate(ctx))
            .or_else(|| self.extras.iter().find_map(|rule| rule.evaluate(ctx)))
            .or_else(|| RoundCapRule.evaluate(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_display_strings() {
        assert_eq!(TerminationReason::MaxRoundsReached.to_string(), "max rounds reached");
        assert_eq!(
            TerminationReason::ConfidenceThreshold.to_string(),
            "confidence threshold reached"
        );
        assert_eq!(
            TerminationReason::AllItemsInvestigated.to_string(),
            "all open items investigated"
        );
        assert_eq!(TerminationReason::Converged.to_string(), "converged");
        assert_eq!(TerminationReason::Custom("budget spent".to_string()).to_string(), "budget spent");
    }

    #[test]
    fn test_default_config() {
        let config = SwarmConfig::default();

        assert_eq!(config.max_rounds, 10);
        assert_eq!(config.convergence_threshold, 0.85);
        assert_eq!(config.min_findings_to_stop, 3);
        assert_eq!(config.stall_nudge, 0.1);
        assert_eq!(config.mode, ExecutionMode::Sequential);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_rounds() {
        let config = SwarmConfig {
            max_rounds: 0,
            ..SwarmConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_rounds"));
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        for threshold in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let config = SwarmConfig {
                convergence_threshold: threshold,
                ..SwarmConfig::default()
            };
            assert!(config.validate().is_err(), "threshold {} should be rejected", threshold);
        }
    }

    #[test]
    fn test_validate_rejects_bad_nudge() {
        for nudge in [0.0, -0.1, f64::NAN] {
            let config = SwarmConfig {
                stall_nudge: nudge,
                ..SwarmConfig::default()
            };
            assert!(config.validate().is_err(), "nudge {} should be rejected", nudge);
        }
    }

    #[test]
    fn test_confidence_rule() {
        let rule = ConfidenceThresholdRule { threshold: 0.85 };
        let mut ctx = RoundContext::new("task", 5);

        assert_eq!(rule.evaluate(&ctx), None);
        ctx.adjust_confidence(0.85);
        assert_eq!(rule.evaluate(&ctx), Some(TerminationReason::ConfidenceThreshold));
    }

    #[test]
    fn test_items_exhausted_rule_needs_findings() {
        let rule = ItemsExhaustedRule { min_findings: 3 };
        let mut ctx = RoundContext::new("task", 5);

        // No open items but also no findings: a fresh context must not stop.
        assert_eq!(rule.evaluate(&ctx), None);

        for i in 0..4 {
            ctx.record_finding("researcher", format!("finding {}", i));
        }
        assert_eq!(rule.evaluate(&ctx), Some(TerminationReason::AllItemsInvestigated));

        ctx.add_open_item("still open");
        assert_eq!(rule.evaluate(&ctx), None);
    }

    #[test]
    fn test_converged_rule() {
        let rule = ConvergedRule;
        let mut ctx = RoundContext::new("task", 5);

        assert_eq!(rule.evaluate(&ctx), None);
        ctx.set_converged(true);
        assert_eq!(rule.evaluate(&ctx), Some(TerminationReason::Converged));
    }

    #[test]
    fn test_round_cap_rule() {
        let rule = RoundCapRule;
        let mut ctx = RoundContext::new("task", 2);

        assert_eq!(rule.evaluate(&ctx), None);
        ctx.begin_round();
        assert_eq!(rule.evaluate(&ctx), None);
        ctx.begin_round();
        assert_eq!(rule.evaluate(&ctx), Some(TerminationReason::MaxRoundsReached));
    }

    #[test]
    fn test_closure_as_rule() {
        let rule = |ctx: &RoundContext| {
            (ctx.findings().len() > 100).then_some(TerminationReason::Custom("too much".to_string()))
        };
        let ctx = RoundContext::new("task", 5);

        assert_eq!(rule.evaluate(&ctx), None);
    }

    #[test]
    fn test_policy_threshold_beats_round_cap() {
        // When the threshold and the cap trip in the same evaluation the
        // threshold is reported; the cap is a safety net, not a tie-winner.
        let policy = TerminationPolicy::assemble(&SwarmConfig::default(), &[]);
        let mut ctx = RoundContext::new("task", 3);

        for _ in 0..3 {
            ctx.begin_round();
            ctx.adjust_confidence(0.3);
        }

        assert_eq!(policy.evaluate(&ctx), Some(TerminationReason::ConfidenceThreshold));
    }

    #[test]
    fn test_policy_custom_rules_run_before_cap() {
        let custom = |_: &RoundContext| Some(TerminationReason::Custom("preempted".to_string()));
        let extras: Vec<Box<dyn TerminationRule>> = vec![Box::new(custom)];
        let policy = TerminationPolicy::assemble(&SwarmConfig::default(), &extras);
        let mut ctx = RoundContext::new("task", 1);
        ctx.begin_round();

        assert_eq!(
            policy.evaluate(&ctx),
            Some(TerminationReason::Custom("preempted".to_string()))
        );
    }

    #[test]
    fn test_policy_returns_none_mid_run() {
        let policy = TerminationPolicy::assemble(&SwarmConfig::default(), &[]);
        let mut ctx = RoundContext::new("task", 10);
        ctx.begin_round();
        ctx.add_open_item("open question");
        ctx.adjust_confidence(0.2);

        assert_eq!(policy.evaluate(&ctx), None);
    }
}
