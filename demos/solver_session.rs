//! Example demonstrating the solver/critic refinement loop.
//!
//! A proposer drafts a plan, a reviewer pushes back once, and the revised
//! plan is approved on the second round. The completion collaborator is
//! scripted in-file so the example runs offline.
//!
//! Run with: cargo run --example solver_session

use async_trait::async_trait;
use quorum::solver::{LlmProposer, LlmReviewer, SolverLoop};
use quorum::Result;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted completion gateway: proposal, rejection, revision, approval.
struct ScriptedGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl quorum::llm::CompletionGateway for ScriptedGateway {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        let responses = [
            "Cache dependencies between CI runs and split the test suite in two.",
            "NEEDS WORK: splitting the suite without balancing shard times will \
             leave one shard dominating the critical path.",
            "Cache dependencies between CI runs and split the test suite into \
             time-balanced shards using historical durations.",
            "APPROVED: time-balanced sharding addresses the critical path concern.",
        ];
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(responses.get(idx).unwrap_or(&"APPROVED: fine.").to_string())
    }

    async fn complete_json(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _schema: Value,
    ) -> Result<Value> {
        Ok(Value::Null)
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    println!("Solver/Critic Session Example");
    println!("=============================\n");

    let gateway = Arc::new(ScriptedGateway {
        calls: AtomicUsize::new(0),
    });

    let solver = SolverLoop::builder(
        Arc::new(LlmProposer::new(gateway.clone())),
        Arc::new(LlmReviewer::new(gateway)),
    )
    .max_rounds(3)
    .build();

    let task = "Cut our CI pipeline time in half";
    println!("Task: {}\n", task);

    let outcome = solver.run(task).await?;

    for turn in &outcome.transcript {
        println!("-- round {}", turn.round);
        println!("   candidate: {}", turn.candidate);
        if let Some(review) = &turn.review {
            println!("   verdict:   {}", review.feedback);
        }
    }

    println!("\nTermination: {}", outcome.reason);
    println!("Converged: {}", outcome.converged());
    if let Some(solution) = outcome.solution {
        println!("\nFinal solution:\n{}", solution);
    }

    Ok(())
}
