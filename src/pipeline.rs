//! Sequential multi-stage pipelines.
//!
//! The simplest collaboration shape: an ordered chain of stages where each
//! stage consumes the previous stage's output (research feeding a writer,
//! extraction feeding a summarizer). Unlike the swarm loop there is no
//! recovery story for a broken link - a failed stage has nothing useful to
//! hand downstream, so the error propagates to the caller.

use crate::error::{QuorumError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// One stage in a sequential pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Name used in logs and the stage output record
    fn name(&self) -> &str;

    /// Transform the previous stage's output into this stage's output
    async fn run(&self, input: &str) -> Result<String>;
}

/// Output of one stage, kept for transparency alongside the final result.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub stage: String,
    pub output: String,
}

/// Final report of a pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The last stage's output
    pub output: String,
    /// Every stage's output, in execution order
    pub stages: Vec<StageOutput>,
}

/// An ordered chain of stages.
///
/// # Examples
///
/// ```ignore
/// use quorum::pipeline::Pipeline;
/// use std::sync::Arc;
///
/// let pipeline = Pipeline::new(vec![Arc::new(research_stage), Arc::new(writer_stage)]);
/// let outcome = pipeline.run("open-source licensing trends").await?;
/// println!("{}", outcome.output);
/// ```
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    /// Create a pipeline from an ordered stage list
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Run every stage in order, feeding each the previous stage's output.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty pipeline; otherwise the
    /// first failing stage's error.
    pub async fn run(&self, input: impl Into<String>) -> Result<PipelineOutcome> {
        if self.stages.is_empty() {
            return Err(QuorumError::ConfigError(
                "pipeline requires at least one stage".to_string(),
            ));
        }

        let mut current = input.into();
        let mut stages = Vec::with_capacity(self.stages.len());

        info!(stages = self.stages.len(), "Starting pipeline run");

        for stage in &self.stages {
            debug!(stage = stage.name(), "Stage started");
            current = stage.run(&current).await?;
            debug!(stage = stage.name(), output_len = current.len(), "Stage finished");
            stages.push(StageOutput {
                stage: stage.name().to_string(),
                output: current.clone(),
            });
        }

        Ok(PipelineOutcome {
            output: current,
            stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SuffixStage {
        name: String,
        suffix: String,
    }

    #[async_trait]
    impl Stage for SuffixStage {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, input: &str) -> Result<String> {
            Ok(format!("{} -> {}", input, self.suffix))
        }
    }

    struct FailingStage;

    #[async_trait]
    impl Stage for FailingStage {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, _input: &str) -> Result<String> {
            Err(QuorumError::ParticipantError("stage backend down".to_string()))
        }
    }

    fn stage(name: &str, suffix: &str) -> Arc<dyn Stage> {
        Arc::new(SuffixStage {
            name: name.to_string(),
            suffix: suffix.to_string(),
        })
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let pipeline = Pipeline::new(vec![stage("research", "researched"), stage("write", "written")]);

        let outcome = pipeline.run("topic").await.unwrap();

        assert_eq!(outcome.output, "topic -> researched -> written");
        assert_eq!(outcome.stages.len(), 2);
        assert_eq!(outcome.stages[0].stage, "research");
        assert_eq!(outcome.stages[0].output, "topic -> researched");
        assert_eq!(outcome.stages[1].stage, "write");
    }

    #[tokio::test]
    async fn test_single_stage_pipeline() {
        let pipeline = Pipeline::new(vec![stage("only", "done")]);

        let outcome = pipeline.run("x").await.unwrap();

        assert_eq!(outcome.output, "x -> done");
    }

    #[tokio::test]
    async fn test_stage_error_propagates() {
        let pipeline = Pipeline::new(vec![stage("research", "researched"), Arc::new(FailingStage)]);

        let err = pipeline.run("topic").await.unwrap_err();

        assert!(err.to_string().contains("stage backend down"));
    }

    #[tokio::test]
    async fn test_empty_pipeline_is_a_config_error() {
        let pipeline = Pipeline::new(vec![]);

        assert!(matches!(
            pipeline.run("topic").await.unwrap_err(),
            QuorumError::ConfigError(_)
        ));
    }
}
