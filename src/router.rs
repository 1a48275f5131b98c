//! Hierarchical triage routing.
//!
//! A router agent in front of a closed set of specialists: the completion
//! collaborator classifies an incoming query against the registered
//! specialist charters, and the query is dispatched to the winner. The
//! specialist set is fixed at construction time; an unrecognized
//! classification falls back to the configured general specialist rather
//! than failing the request.

use crate::error::{QuorumError, Result};
use crate::llm::CompletionGateway;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A department a query can be routed to.
#[async_trait]
pub trait Specialist: Send + Sync {
    /// Department name the classifier routes by
    fn name(&self) -> &str;

    /// One-line description of what this specialist handles, shown to the
    /// classifier
    fn charter(&self) -> &str;

    /// Handle a query routed to this specialist
    async fn handle(&self, query: &str) -> Result<String>;
}

/// The classifier's routing decision.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RoutingDecision {
    /// Department name chosen by the classifier
    pub department: String,
    /// Classifier's confidence in the choice, 0.0 to 1.0
    #[serde(default)]
    pub confidence: f64,
    /// Brief explanation of the choice
    #[serde(default)]
    pub reasoning: String,
}

/// The routed response together with how it was routed.
#[derive(Debug)]
pub struct RoutedReply {
    /// Name of the specialist that handled the query
    pub specialist: String,
    /// The classifier's decision, kept for transparency
    pub decision: RoutingDecision,
    /// The specialist's answer
    pub reply: String,
}

const CLASSIFIER_SYSTEM_PROMPT: &str = "You are a router for a support system.\n\
     Your ONLY job is to analyze incoming messages and decide which \
     specialist should handle them.\n\
     Pick exactly one department from the list. Use the fallback department \
     for anything that fits nowhere else.";

/// Routes queries to a closed set of specialists via a classifier decision.
///
/// # Examples
///
/// ```ignore
/// use quorum::router::TriageRouter;
/// use std::sync::Arc;
///
/// let router = TriageRouter::new(gateway, vec![billing, technical, general], "general")?;
/// let routed = router.route("I was charged twice this month").await?;
/// println!("[{}] {}", routed.specialist, routed.reply);
/// ```
pub struct TriageRouter {
    gateway: Arc<dyn CompletionGateway>,
    specialists: Vec<Arc<dyn Specialist>>,
    fallback: String,
}

impl std::fmt::Debug for TriageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageRouter")
            .field("specialists", &self.specialists.len())
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl TriageRouter {
    /// Create a router over a fixed specialist set.
    ///
    /// # Errors
    ///
    /// Fails if the specialist list is empty or the fallback name does not
    /// match a registered specialist.
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        specialists: Vec<Arc<dyn Specialist>>,
        fallback: impl Into<String>,
    ) -> Result<Self> {
        let fallback = fallback.into();
        if specialists.is_empty() {
            return Err(QuorumError::ConfigError("no specialists registered".to_string()));
        }
        if !specialists.iter().any(|s| s.name().eq_ignore_ascii_case(&fallback)) {
            return Err(QuorumError::ConfigError(format!(
                "fallback department '{}' is not a registered specialist",
                fallback
            )));
        }
        Ok(Self {
            gateway,
            specialists,
            fallback,
        })
    }

    /// Classify a query and dispatch it to the chosen specialist.
    pub async fn route(&self, query: &str) -> Result<RoutedReply> {
        let decision = self.classify(query).await?;
        debug!(
            department = decision.department.as_str(),
            confidence = decision.confidence,
            "Query classified"
        );

        let specialist = match self.lookup(&decision.department) {
            Some(specialist) => specialist,
            None => {
                warn!(
                    department = decision.department.as_str(),
                    fallback = self.fallback.as_str(),
                    "Unknown department; using fallback"
                );
                // new() guarantees the fallback is registered
                self.lookup(&self.fallback).ok_or_else(|| {
                    QuorumError::RoutingError(format!(
                        "fallback specialist '{}' disappeared",
                        self.fallback
                    ))
                })?
            }
        };

        info!(specialist = specialist.name(), "Dispatching query");
        let reply = specialist.handle(query).await?;

        Ok(RoutedReply {
            specialist: specialist.name().to_string(),
            decision,
            reply,
        })
    }

    async fn classify(&self, query: &str) -> Result<RoutingDecision> {
        let roster = self
            .specialists
            .iter()
            .map(|s| format!("- {}: {}", s.name().to_uppercase(), s.charter()))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Specialists available:\n{}\n\nFallback department: {}\n\nMessage:\n{}",
            roster,
            self.fallback.to_uppercase(),
            query
        );

        let schema = serde_json::to_value(schemars::schema_for!(RoutingDecision))?;
        let value =
            self.gateway.complete_json(CLASSIFIER_SYSTEM_PROMPT, &prompt, schema).await?;
        let decision: RoutingDecision = serde_json::from_value(value)?;
        Ok(decision)
    }

    fn lookup(&self, department: &str) -> Option<&Arc<dyn Specialist>> {
        self.specialists.iter().find(|s| s.name().eq_ignore_ascii_case(department))
    }
}
