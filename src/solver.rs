//! Solver/critic refinement loop.
//!
//! A specialization of the convergence loop with exactly two roles per
//! round: a [`Proposer`] that drafts or revises a candidate solution, and a
//! [`Reviewer`] that evaluates the candidate and decides whether the run has
//! converged. The loop stops when the reviewer approves or the round cap is
//! hit.
//!
//! The proposer's contract makes the first round explicit: it receives
//! `None` when there is no prior candidate to revise (produce an initial
//! draft from the task alone) and `Some(draft)` with the previous candidate
//! and the reviewer's latest feedback afterwards.
//!
//! Role failures follow the same policy as the swarm loop: a failed proposer
//! round produces no new candidate, a failed reviewer round counts as
//! not-approved, and in both cases the loop keeps moving toward the round
//! cap instead of aborting.

use crate::error::{QuorumError, Result};
use crate::llm::CompletionGateway;
use crate::swarm::policy::TerminationReason;
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A reviewer's verdict on one candidate.
#[derive(Debug, Clone)]
pub struct Review {
    /// Whether the candidate was judged acceptable
    pub approved: bool,
    /// The reviewer's full feedback text
    pub feedback: String,
}

/// The previous round's candidate together with the feedback it received.
#[derive(Debug, Clone)]
pub struct ReviewedDraft {
    pub candidate: String,
    pub feedback: String,
}

/// One completed round of the refinement loop.
#[derive(Debug, Clone)]
pub struct SolverTurn {
    pub round: usize,
    pub candidate: String,
    /// `None` when the reviewer failed this round
    pub review: Option<Review>,
}

/// Drafts and revises candidate solutions.
#[async_trait]
pub trait Proposer: Send + Sync {
    /// Produce a candidate for the task.
    ///
    /// `prior` is `None` on the first round; afterwards it carries the
    /// previous candidate and the reviewer's latest feedback.
    async fn propose(&self, task: &str, prior: Option<&ReviewedDraft>) -> Result<String>;
}

/// Evaluates candidates and signals convergence.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Judge a candidate. `round` and `max_rounds` let implementations
    /// calibrate strictness as the budget runs out.
    async fn review(
        &self,
        task: &str,
        candidate: &str,
        round: usize,
        max_rounds: usize,
    ) -> Result<Review>;
}

/// Final report of a refinement run.
#[derive(Debug)]
pub struct SolverOutcome {
    /// The latest candidate, if any round produced one
    pub solution: Option<String>,
    /// Every completed round, oldest first
    pub transcript: Vec<SolverTurn>,
    /// How many rounds actually ran
    pub rounds_run: usize,
    /// Why the run stopped
    pub reason: TerminationReason,
}

impl SolverOutcome {
    /// Whether the reviewer approved the final candidate
    pub fn converged(&self) -> bool {
        self.reason == TerminationReason::Converged
    }
}

/// The two-role refinement loop.
///
/// # Examples
///
/// ```ignore
/// use quorum::solver::SolverLoop;
/// use std::sync::Arc;
///
/// let solver = SolverLoop::builder(Arc::new(proposer), Arc::new(reviewer))
///     .max_rounds(3)
///     .build();
///
/// let outcome = solver.run("Reduce checkout latency below 200ms").await?;
/// if outcome.converged() {
///     println!("{}", outcome.solution.unwrap());
/// }
/// ```
pub struct SolverLoop {
    proposer: Arc<dyn Proposer>,
    reviewer: Arc<dyn Reviewer>,
    max_rounds: usize,
}

impl SolverLoop {
    /// Create a solver loop builder
    pub fn builder(proposer: Arc<dyn Proposer>, reviewer: Arc<dyn Reviewer>) -> SolverLoopBuilder {
        SolverLoopBuilder::new(proposer, reviewer)
    }

    /// Execute the refinement loop for a task.
    ///
    /// # Errors
    ///
    /// Only configuration problems surface here; role failures are contained
    /// within the loop.
    pub async fn run(&self, task: impl Into<String>) -> Result<SolverOutcome> {
        if self.max_rounds == 0 {
            return Err(QuorumError::ConfigError("max_rounds must be at least 1".to_string()));
        }

        let task = task.into();
        let mut prior: Option<ReviewedDraft> = None;
        let mut transcript: Vec<SolverTurn> = Vec::new();
        let mut round = 0;
        let mut approved = false;

        info!(task = task.as_str(), max_rounds = self.max_rounds, "Starting refinement run");

        let reason = loop {
            // Check before acting, so an approved candidate never triggers
            // another proposal round.
            if approved {
                break TerminationReason::Converged;
            }
            if round >= self.max_rounds {
                break TerminationReason::MaxRoundsReached;
            }

            round += 1;
            debug!(round, "Refinement round started");

            let candidate = match self.proposer.propose(&task, prior.as_ref()).await {
                Ok(candidate) => candidate,
                Err(error) => {
                    warn!(round, error = %error, "Proposer failed; no candidate this round");
                    continue;
                }
            };

            let review = match self
                .reviewer
                .review(&task, &candidate, round, self.max_rounds)
                .await
            {
                Ok(review) => {
                    debug!(round, approved = review.approved, "Candidate reviewed");
                    Some(review)
                }
                Err(error) => {
                    warn!(round, error = %error, "Reviewer failed; treating candidate as not approved");
                    None
                }
            };

            approved = review.as_ref().map(|r| r.approved).unwrap_or(false);
            prior = Some(ReviewedDraft {
                candidate: candidate.clone(),
                feedback: review.as_ref().map(|r| r.feedback.clone()).unwrap_or_default(),
            });
            transcript.push(SolverTurn {
                round,
                candidate,
                review,
            });
        };

        info!(rounds = round, reason = %reason, "Refinement run terminated");

        Ok(SolverOutcome {
            solution: prior.map(|draft| draft.candidate),
            transcript,
            rounds_run: round,
            reason,
        })
    }
}

/// Builder for constructing a [`SolverLoop`] with custom configuration.
pub struct SolverLoopBuilder {
    proposer: Arc<dyn Proposer>,
    reviewer: Arc<dyn Reviewer>,
    max_rounds: usize,
}

impl SolverLoopBuilder {
    fn new(proposer: Arc<dyn Proposer>, reviewer: Arc<dyn Reviewer>) -> Self {
        Self {
            proposer,
            reviewer,
            max_rounds: 3,
        }
    }

    /// Set the round cap (default: 3)
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Build the solver loop
    pub fn build(self) -> SolverLoop {
        SolverLoop {
            proposer: self.proposer,
            reviewer: self.reviewer,
            max_rounds: self.max_rounds,
        }
    }
}

const PROPOSER_SYSTEM_PROMPT: &str = "You are a problem solver. Your job is to propose solutions \
     and improve them based on feedback. Be specific and practical in your suggestions.";

/// A proposer backed by the completion collaborator.
///
/// Branches on whether a prior draft exists: the first round asks for an
/// initial solution from the task alone, later rounds ask for a revision
/// addressing the reviewer's feedback.
pub struct LlmProposer {
    gateway: Arc<dyn CompletionGateway>,
    system_prompt: String,
}

impl LlmProposer {
    /// Create a proposer with the default system prompt
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            gateway,
            system_prompt: PROPOSER_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Override the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[async_trait]
impl Proposer for LlmProposer {
    async fn propose(&self, task: &str, prior: Option<&ReviewedDraft>) -> Result<String> {
        let prompt = match prior {
            None => format!(
                "Problem: {}\n\nPropose an initial solution. Be specific and actionable.",
                task
            ),
            Some(draft) => format!(
                "Problem: {}\n\nCurrent solution:\n{}\n\nFeedback received:\n{}\n\n\
                 Improve the solution based on this feedback. Address the specific concerns raised.",
                task, draft.candidate, draft.feedback
            ),
        };

        self.gateway.complete(&self.system_prompt, &prompt).await
    }
}

const REVIEWER_SYSTEM_PROMPT: &str = "You are a critical reviewer. Evaluate the proposed solution \
     for the given problem.\n\n\
     If the solution is good enough (addresses the core problem, is practical, and reasonably \
     complete), respond with: \"APPROVED: [brief praise]\"\n\n\
     If improvements are needed, respond with: \"NEEDS WORK: [specific feedback]\"\n\n\
     Be constructive but don't be a perfectionist - approve good solutions.";

/// A reviewer backed by the completion collaborator.
///
/// Parses the verdict from the front of the response; anything that does not
/// open with an APPROVED verdict counts as not approved.
pub struct LlmReviewer {
    gateway: Arc<dyn CompletionGateway>,
    verdict: Regex,
}

impl LlmReviewer {
    /// Create a reviewer with the standard verdict protocol
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            gateway,
            verdict: Regex::new(r"(?i)^\s*approved\b").unwrap(),
        }
    }
}

#[async_trait]
impl Reviewer for LlmReviewer {
    async fn review(
        &self,
        task: &str,
        candidate: &str,
        round: usize,
        max_rounds: usize,
    ) -> Result<Review> {
        let leniency = if round >= max_rounds {
            "\nThis is the last iteration, so be more lenient."
        } else {
            ""
        };
        let prompt = format!(
            "Problem: {}\n\nProposed solution:\n{}\n\nThis is iteration {} of {}.{}\n\nEvaluate:",
            task, candidate, round, max_rounds, leniency
        );

        let feedback = self.gateway.complete(REVIEWER_SYSTEM_PROMPT, &prompt).await?;
        let approved = self.verdict.is_match(&feedback);

        Ok(Review { approved, feedback })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Proposer returning scripted candidates, recording what it was given.
    struct ScriptedProposer {
        candidates: Vec<Result<String>>,
        calls: AtomicUsize,
        priors_seen: Mutex<Vec<Option<ReviewedDraft>>>,
    }

    impl ScriptedProposer {
        fn new(candidates: Vec<Result<String>>) -> Self {
            Self {
                candidates,
                calls: AtomicUsize::new(0),
                priors_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Proposer for ScriptedProposer {
        async fn propose(&self, _task: &str, prior: Option<&ReviewedDraft>) -> Result<String> {
            self.priors_seen.lock().unwrap().push(prior.cloned());
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.candidates.get(idx) {
                Some(Ok(candidate)) => Ok(candidate.clone()),
                Some(Err(_)) => {
                    Err(QuorumError::ParticipantError("proposer outage".to_string()))
                }
                None => Ok("default candidate".to_string()),
            }
        }
    }

    /// Reviewer approving from a scripted round onwards.
    struct ApprovesAtRound {
        approve_from: usize,
    }

    #[async_trait]
    impl Reviewer for ApprovesAtRound {
        async fn review(
            &self,
            _task: &str,
            candidate: &str,
            round: usize,
            _max_rounds: usize,
        ) -> Result<Review> {
            if round >= self.approve_from {
                Ok(Review {
                    approved: true,
                    feedback: format!("APPROVED: {} is good", candidate),
                })
            } else {
                Ok(Review {
                    approved: false,
                    feedback: "NEEDS WORK: tighten the rollout plan".to_string(),
                })
            }
        }
    }

    /// Reviewer that always errors.
    struct BrokenReviewer;

    #[async_trait]
    impl Reviewer for BrokenReviewer {
        async fn review(
            &self,
            _task: &str,
            _candidate: &str,
            _round: usize,
            _max_rounds: usize,
        ) -> Result<Review> {
            Err(QuorumError::ParticipantError("reviewer outage".to_string()))
        }
    }

    /// Gateway returning scripted responses, recording received prompts.
    struct MockGateway {
        responses: Vec<String>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl MockGateway {
        fn new(responses: Vec<String>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionGateway for MockGateway {
        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .responses
                .get(idx)
                .cloned()
                .unwrap_or_else(|| "default response".to_string()))
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

    fn ok(text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn outage() -> Result<String> {
        Err(QuorumError::ParticipantError("proposer outage".to_string()))
    }

    #[tokio::test]
    async fn test_approval_on_round_two_converges() {
        let proposer = Arc::new(ScriptedProposer::new(vec![ok("draft 1"), ok("draft 2")]));
        let solver = SolverLoop::builder(proposer, Arc::new(ApprovesAtRound { approve_from: 2 }))
            .max_rounds(5)
            .build();

        let outcome = solver.run("scenario b").await.unwrap();

        assert_eq!(outcome.rounds_run, 2);
        assert_eq!(outcome.reason, TerminationReason::Converged);
        assert!(outcome.converged());
        assert_eq!(outcome.solution.as_deref(), Some("draft 2"));
        assert_eq!(outcome.transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_no_approval_exhausts_the_round_budget() {
        let proposer =
            Arc::new(ScriptedProposer::new(vec![ok("draft 1"), ok("draft 2"), ok("draft 3")]));
        let solver = SolverLoop::builder(proposer, Arc::new(ApprovesAtRound { approve_from: 99 }))
            .max_rounds(3)
            .build();

        let outcome = solver.run("stubborn problem").await.unwrap();

        assert_eq!(outcome.rounds_run, 3);
        assert_eq!(outcome.reason, TerminationReason::MaxRoundsReached);
        assert!(!outcome.converged());
        // The latest candidate is still returned as partial progress.
        assert_eq!(outcome.solution.as_deref(), Some("draft 3"));
    }

    #[tokio::test]
    async fn test_proposer_sees_initial_then_revision_contract() {
        let proposer = Arc::new(ScriptedProposer::new(vec![ok("draft 1"), ok("draft 2")]));
        let solver =
            SolverLoop::builder(proposer.clone(), Arc::new(ApprovesAtRound { approve_from: 2 }))
                .max_rounds(5)
                .build();

        solver.run("contract check").await.unwrap();

        let priors = proposer.priors_seen.lock().unwrap();
        assert_eq!(priors.len(), 2);
        assert!(priors[0].is_none());
        let revision = priors[1].as_ref().unwrap();
        assert_eq!(revision.candidate, "draft 1");
        assert!(revision.feedback.contains("NEEDS WORK"));
    }

    #[tokio::test]
    async fn test_proposer_failure_skips_the_round_without_aborting() {
        let proposer = Arc::new(ScriptedProposer::new(vec![outage(), ok("draft 2")]));
        let solver =
            SolverLoop::builder(proposer.clone(), Arc::new(ApprovesAtRound { approve_from: 1 }))
                .max_rounds(5)
                .build();

        let outcome = solver.run("flaky proposer").await.unwrap();

        // Round 1 produced nothing; round 2's candidate was approved.
        assert_eq!(outcome.rounds_run, 2);
        assert_eq!(outcome.reason, TerminationReason::Converged);
        assert_eq!(outcome.solution.as_deref(), Some("draft 2"));
        assert_eq!(outcome.transcript.len(), 1);
        // The round-2 proposal was still treated as initial: no prior draft
        // existed to revise.
        assert!(proposer.priors_seen.lock().unwrap()[1].is_none());
    }

    #[tokio::test]
    async fn test_reviewer_failure_counts_as_not_approved() {
        let proposer = Arc::new(ScriptedProposer::new(vec![ok("draft 1"), ok("draft 2")]));
        let solver = SolverLoop::builder(proposer, Arc::new(BrokenReviewer)).max_rounds(2).build();

        let outcome = solver.run("flaky reviewer").await.unwrap();

        assert_eq!(outcome.rounds_run, 2);
        assert_eq!(outcome.reason, TerminationReason::MaxRoundsReached);
        assert_eq!(outcome.solution.as_deref(), Some("draft 2"));
        assert!(outcome.transcript.iter().all(|turn| turn.review.is_none()));
    }

    #[tokio::test]
    async fn test_zero_max_rounds_is_a_config_error() {
        let proposer = Arc::new(ScriptedProposer::new(vec![]));
        let solver = SolverLoop::builder(proposer, Arc::new(ApprovesAtRound { approve_from: 1 }))
            .max_rounds(0)
            .build();

        assert!(matches!(
            solver.run("invalid").await.unwrap_err(),
            QuorumError::ConfigError(_)
        ));
    }

    #[tokio::test]
    async fn test_llm_proposer_initial_prompt() {
        let gateway = Arc::new(MockGateway::new(vec!["an initial draft".to_string()]));
        let proposer = LlmProposer::new(gateway.clone());

        let candidate = proposer.propose("cut the build time", None).await.unwrap();

        assert_eq!(candidate, "an initial draft");
        let prompts = gateway.prompts.lock().unwrap();
        assert!(prompts[0].1.contains("Propose an initial solution"));
        assert!(prompts[0].1.contains("cut the build time"));
    }

    #[tokio::test]
    async fn test_llm_proposer_revision_prompt_carries_feedback() {
        let gateway = Arc::new(MockGateway::new(vec!["a revised draft".to_string()]));
        let proposer = LlmProposer::new(gateway.clone());
        let prior = ReviewedDraft {
            candidate: "the old draft".to_string(),
            feedback: "NEEDS WORK: cache the dependencies".to_string(),
        };

        proposer.propose("cut the build time", Some(&prior)).await.unwrap();

        let prompts = gateway.prompts.lock().unwrap();
        assert!(prompts[0].1.contains("the old draft"));
        assert!(prompts[0].1.contains("cache the dependencies"));
        assert!(prompts[0].1.contains("Improve the solution"));
    }

    #[tokio::test]
    async fn test_llm_reviewer_parses_approval() {
        for response in ["APPROVED: solid plan", "approved: fine", "  Approved: yes"] {
            let gateway = Arc::new(MockGateway::new(vec![response.to_string()]));
            let reviewer = LlmReviewer::new(gateway);

            let review = reviewer.review("task", "candidate", 1, 3).await.unwrap();

            assert!(review.approved, "{:?} should be an approval", response);
            assert_eq!(review.feedback, response);
        }
    }

    #[tokio::test]
    async fn test_llm_reviewer_rejects_non_approvals() {
        for response in [
            "NEEDS WORK: missing a rollback step",
            "DISAPPROVED: no",
            "Approvedly vague",
            "The plan is approved by me",
        ] {
            let gateway = Arc::new(MockGateway::new(vec![response.to_string()]));
            let reviewer = LlmReviewer::new(gateway);

            let review = reviewer.review("task", "candidate", 1, 3).await.unwrap();

            assert!(!review.approved, "{:?} should not be an approval", response);
        }
    }

    #[tokio::test]
    async fn test_llm_reviewer_adds_leniency_hint_on_final_round() {
        let gateway = Arc::new(MockGateway::new(vec![
            "NEEDS WORK: a".to_string(),
            "NEEDS WORK: b".to_string(),
        ]));
        let reviewer = LlmReviewer::new(gateway.clone());

        reviewer.review("task", "candidate", 1, 3).await.unwrap();
        reviewer.review("task", "candidate", 3, 3).await.unwrap();

        let prompts = gateway.prompts.lock().unwrap();
        assert!(!prompts[0].1.contains("be more lenient"));
        assert!(prompts[1].1.contains("be more lenient"));
        assert!(prompts[1].1.contains("iteration 3 of 3"));
    }
}
