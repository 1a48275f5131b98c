//! Critic role: challenges weak claims and queues verification work.

use crate::context::RoundContext;
use crate::error::Result;
use crate::llm::CompletionGateway;
use crate::participant::{Contribution, Participant};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Findings the critic needs before challenging anything.
const MIN_FINDINGS: usize = 3;
/// How many recent findings go into the prompt.
const FINDINGS_WINDOW: usize = 8;

const SYSTEM_PROMPT: &str = "You are a critic agent in an investigation swarm.\n\
     Your job is to challenge findings and identify:\n\
     1. Weak claims that need more evidence\n\
     2. Assumptions being made\n\
     3. Alternative explanations\n\n\
     Set confidence_adjustment between -0.1 and 0.1: negative when the \
     findings look shaky, positive when they hold up.";

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct CritiqueReport {
    #[serde(default)]
    challenges: Vec<String>,
    #[serde(default)]
    needs_verification: Vec<String>,
    #[serde(default)]
    confidence_adjustment: f64,
}

/// Challenges assumptions in the accumulated findings.
///
/// Skips rounds until at least three findings exist. Challenges become new
/// findings; claims needing verification become `Verify:` open items. The
/// confidence adjustment may be negative - the context clamps the score at
/// zero when it is merged.
pub struct Critic {
    gateway: Arc<dyn CompletionGateway>,
}

impl Critic {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Participant for Critic {
    fn name(&self) -> &str {
        "critic"
    }

    async fn contribute(&self, ctx: &RoundContext) -> Result<Contribution> {
        if ctx.findings().len() < MIN_FINDINGS {
            return Ok(Contribution::none());
        }

        let findings_text = ctx.recent_findings_text(FINDINGS_WINDOW);
        let schema = serde_json::to_value(schemars::schema_for!(CritiqueReport))?;
        let prompt =
            format!("Task: {}\n\nFindings to critique:\n{}", ctx.task(), findings_text);
        let value = self.gateway.complete_json(SYSTEM_PROMPT, &prompt, schema).await?;
        let report: CritiqueReport = serde_json::from_value(value)?;

        debug!(
            challenges = report.challenges.len(),
            needs_verification = report.needs_verification.len(),
            adjustment = report.confidence_adjustment,
            "Critic reported"
        );

        let mut contribution =
            Contribution::new().with_confidence_delta(report.confidence_adjustment);
        for challenge in report.challenges {
            contribution = contribution.with_finding(format!("Challenge: {}", challenge));
        }
        for claim in report.needs_verification {
            contribution = contribution.with_open_item(format!("Verify: {}", claim));
        }

        Ok(contribution)
    }
}
