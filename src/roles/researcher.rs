//! Researcher role: investigates open items with the search collaborator.

use crate::context::RoundContext;
use crate::error::Result;
use crate::llm::{CompletionGateway, SearchProvider};
use crate::participant::{Contribution, Participant};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a research agent in an investigation swarm.\n\
     Analyze search results and extract:\n\
     1. Key findings (facts, data, insights)\n\
     2. New questions or threads to investigate\n\n\
     Report findings as short standalone statements and keep new threads \
     phrased as searchable questions.\n\
     Set confidence_boost between 0.0 and 0.2 based on how much the results \
     advanced the task.";

fn default_boost() -> f64 {
    0.05
}

/// Structured contribution requested from the completion collaborator.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct ResearchReport {
    #[serde(default)]
    findings: Vec<String>,
    #[serde(default)]
    new_threads: Vec<String>,
    #[serde(default = "default_boost")]
    confidence_boost: f64,
}

/// Searches for factual information on the frontmost open item.
///
/// On a virgin context (nothing open, nothing investigated yet) the task
/// itself is the first thread; afterwards the researcher skips rounds where
/// no open items remain. A search failure is not fatal: its message is
/// passed through as the result text so the completion step can still reason
/// about the attempt, matching how a human researcher would report a dead
/// end.
pub struct Researcher {
    search: Arc<dyn SearchProvider>,
    gateway: Arc<dyn CompletionGateway>,
}

impl Researcher {
    pub fn new(search: Arc<dyn SearchProvider>, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { search, gateway }
    }
}

#[async_trait]
impl Participant for Researcher {
    fn name(&self) -> &str {
        "researcher"
    }

    async fn contribute(&self, ctx: &RoundContext) -> Result<Contribution> {
        let thread = match ctx.open_items().first() {
            Some(thread) => thread.clone(),
            None if ctx.investigated().is_empty() => ctx.task().to_string(),
            None => return Ok(Contribution::none()),
        };

        debug!(thread = thread.as_str(), "Researcher investigating");

        let result_text = match self.search.search(&thread).await {
            Ok(results) if !results.is_empty() => results,
            Ok(_) => "No results found.".to_string(),
            Err(error) => format!("Search failed: {}", error),
        };

        let schema = serde_json::to_value(schemars::schema_for!(ResearchReport))?;
        let prompt = format!(
            "Task: {}\n\nSearch results for '{}':\n{}",
            ctx.task(),
            thread,
            result_text
        );
        let value = self.gateway.complete_json(SYSTEM_PROMPT, &prompt, schema).await?;
        let report: ResearchReport = serde_json::from_value(value)?;

        debug!(
            findings = report.findings.len(),
            new_threads = report.new_threads.len(),
            "Researcher reported"
        );

        let mut contribution = Contribution::new()
            .with_investigated(thread)
            .with_confidence_delta(report.confidence_boost);
        for finding in report.findings {
            contribution = contribution.with_finding(finding);
        }
        for new_thread in report.new_threads {
            contribution = contribution.with_open_item(new_thread);
        }

        Ok(contribution)
    }
}
