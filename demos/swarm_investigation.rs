//! Example demonstrating an investigation swarm end to end.
//!
//! A researcher, an analyst and a critic collaborate over a shared round
//! context until the confidence threshold is reached, then a synthesizer
//! writes up the findings. The LLM and search collaborators are scripted
//! in-file so the example runs offline; swap them for real implementations
//! to investigate live topics.
//!
//! Run with: cargo run --example swarm_investigation

use async_trait::async_trait;
use quorum::llm::{CompletionGateway, SearchProvider};
use quorum::roles::{Analyst, Critic, Researcher, Synthesizer};
use quorum::swarm::{Swarm, SwarmEvent};
use quorum::Result;
use serde_json::{json, Value};
use std::sync::Arc;

/// Scripted stand-in for a hosted model: answers each role by recognising
/// its system prompt.
struct CannedGateway;

#[async_trait]
impl CompletionGateway for CannedGateway {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        Ok(format!(
            "Executive Summary: the investigation converged.\n\n\
             Key Findings: see below.\n\n{}",
            user_prompt.lines().skip(2).collect::<Vec<_>>().join("\n")
        ))
    }

    async fn complete_json(
        &self,
        system_prompt: &str,
        _user_prompt: &str,
        _schema: Value,
    ) -> Result<Value> {
        let value = if system_prompt.contains("research agent") {
            json!({
                "findings": [
                    "Registries address layers by content digest",
                    "Identical layers are stored once per repository namespace"
                ],
                "new_threads": ["How do cross-repository blob mounts work?"],
                "confidence_boost": 0.2
            })
        } else if system_prompt.contains("analyst agent") {
            json!({
                "patterns": ["Deduplication relies entirely on digest equality"],
                "gaps": ["What happens when compression settings differ?"],
                "confidence_boost": 0.1
            })
        } else {
            json!({
                "challenges": ["Namespace-level dedup claims need a source"],
                "needs_verification": ["the once-per-namespace claim"],
                "confidence_adjustment": 0.05
            })
        };
        Ok(value)
    }
}

/// Scripted stand-in for a search API.
struct CannedSearch;

#[async_trait]
impl SearchProvider for CannedSearch {
    async fn search(&self, query: &str) -> Result<String> {
        Ok(format!(
            "- OCI distribution spec: content-addressable blobs ({})\n\
             - Registry internals blog: layer digests and mounts",
            query
        ))
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    println!("Investigation Swarm Example");
    println!("===========================\n");

    let gateway: Arc<dyn CompletionGateway> = Arc::new(CannedGateway);
    let search: Arc<dyn SearchProvider> = Arc::new(CannedSearch);

    let swarm = Swarm::builder()
        .participant(Arc::new(Researcher::new(search, gateway.clone())))
        .participant(Arc::new(Analyst::new(gateway.clone())))
        .participant(Arc::new(Critic::new(gateway.clone())))
        .max_rounds(10)
        .convergence_threshold(0.85)
        .build();

    swarm
        .emitter
        .subscribe(|event| match event {
            SwarmEvent::RoundStarted {
                round,
                open_items,
                findings,
                confidence,
            } => {
                println!(
                    "-- round {} | open: {} | findings: {} | confidence: {:.2}",
                    round, open_items, findings, confidence
                );
            }
            SwarmEvent::ParticipantContributed {
                name, findings, ..
            } => {
                println!("   {} contributed {} findings", name, findings);
            }
            SwarmEvent::ParticipantSkipped { name, .. } => {
                println!("   {} skipped", name);
            }
            _ => {}
        })
        .await;

    let task = "How do container registries deduplicate image layers?";
    println!("Task: {}\n", task);

    let outcome = swarm.run(task).await?;

    println!("\nTermination: {}", outcome.reason);
    println!("Rounds: {}", outcome.rounds_run);
    println!("Findings: {}", outcome.total_findings());
    println!("Threads investigated: {}", outcome.context.investigated().len());
    println!("Final confidence: {:.2}\n", outcome.context.confidence());

    let synthesizer = Synthesizer::new(gateway);
    let answer = synthesizer.synthesize(&outcome.context).await?;

    println!("{}", "=".repeat(50));
    println!("{}", answer);
    println!("{}", "=".repeat(50));

    Ok(())
}
