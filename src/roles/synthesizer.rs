//! Synthesizer: turns a finished context into a final answer.

use crate::context::RoundContext;
use crate::error::Result;
use crate::llm::CompletionGateway;
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a synthesizer.\n\
     Take all the findings from the investigation and create a comprehensive, \
     well-organized answer.\n\n\
     Structure your response:\n\
     1. Executive Summary (2-3 sentences)\n\
     2. Key Findings (the most important discoveries)\n\
     3. Analysis (patterns, connections, implications)\n\
     4. Caveats (limitations, challenges raised, uncertainties)\n\
     5. Conclusion\n\n\
     Be thorough but concise. This is the final output of the investigation.";

/// Produces the final answer from everything a swarm run accumulated.
///
/// Not a participant: it runs once, after the loop has terminated, over the
/// full findings log.
pub struct Synthesizer {
    gateway: Arc<dyn CompletionGateway>,
}

impl Synthesizer {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway }
    }

    /// Write up the investigation's findings as a structured answer.
    pub async fn synthesize(&self, ctx: &RoundContext) -> Result<String> {
        let findings_text = ctx.recent_findings_text(ctx.findings().len());
        debug!(findings = ctx.findings().len(), "Synthesizing final answer");

        let prompt = format!(
            "Task: {}\n\nAll findings from the investigation:\n{}",
            ctx.task(),
            findings_text
        );

        self.gateway.complete(SYSTEM_PROMPT, &prompt).await
    }
}
