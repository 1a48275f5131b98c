//! Analyst role: finds patterns and gaps across accumulated findings.

use crate::context::RoundContext;
use crate::error::Result;
use crate::llm::CompletionGateway;
use crate::participant::{Contribution, Participant};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Findings the analyst needs before it has anything to compare.
const MIN_FINDINGS: usize = 2;
/// How many recent findings go into the prompt.
const FINDINGS_WINDOW: usize = 10;

const SYSTEM_PROMPT: &str = "You are an analyst agent in an investigation swarm.\n\
     Look at the findings and identify:\n\
     1. Patterns or connections between findings\n\
     2. Contradictions that need resolution\n\
     3. Gaps in knowledge\n\n\
     Set confidence_boost between 0.0 and 0.15 based on how much structure \
     you found.";

fn default_boost() -> f64 {
    0.05
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct AnalysisReport {
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    contradictions: Vec<String>,
    #[serde(default)]
    gaps: Vec<String>,
    #[serde(default = "default_boost")]
    confidence_boost: f64,
}

/// Looks for patterns and connections in the findings collected so far.
///
/// Skips rounds until at least two findings exist. Patterns become new
/// findings; knowledge gaps become open items for the researcher to pick up.
pub struct Analyst {
    gateway: Arc<dyn CompletionGateway>,
}

impl Analyst {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Participant for Analyst {
    fn name(&self) -> &str {
        "analyst"
    }

    async fn contribute(&self, ctx: &RoundContext) -> Result<Contribution> {
        if ctx.findings().len() < MIN_FINDINGS {
            return Ok(Contribution::none());
        }

        let findings_text = ctx.recent_findings_text(FINDINGS_WINDOW);
        let schema = serde_json::to_value(schemars::schema_for!(AnalysisReport))?;
        let prompt = format!("Task: {}\n\nCurrent findings:\n{}", ctx.task(), findings_text);
        let value = self.gateway.complete_json(SYSTEM_PROMPT, &prompt, schema).await?;
        let report: AnalysisReport = serde_json::from_value(value)?;

        debug!(
            patterns = report.patterns.len(),
            contradictions = report.contradictions.len(),
            gaps = report.gaps.len(),
            "Analyst reported"
        );

        let mut contribution = Contribution::new().with_confidence_delta(report.confidence_boost);
        for pattern in report.patterns {
            contribution = contribution.with_finding(format!("Pattern: {}", pattern));
        }
        for gap in report.gaps {
            contribution = contribution.with_open_item(gap);
        }

        Ok(contribution)
    }
}
