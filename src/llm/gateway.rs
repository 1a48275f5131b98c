//! Abstract interface for LLM completion providers.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Abstract interface for an LLM completion service.
///
/// Participants and routers hand a gateway a system prompt and a user prompt
/// and get text back; for structured contributions they additionally pass a
/// JSON schema and get a value conforming to it. How the provider achieves
/// that (response-format flags, grammar constraints, retries, tool-calling
/// under the hood) is the implementation's concern.
///
/// # Examples
///
/// ```
/// use quorum::llm::CompletionGateway;
/// use quorum::Result;
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
///
/// struct CannedGateway;
///
/// #[async_trait]
/// impl CompletionGateway for CannedGateway {
///     async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
///         Ok("a canned answer".to_string())
///     }
///
///     async fn complete_json(
///         &self,
///         _system_prompt: &str,
///         _user_prompt: &str,
///         _schema: Value,
///     ) -> Result<Value> {
///         Ok(json!({ "findings": [] }))
///     }
/// }
/// ```
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Complete a request with a free-text response
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Complete a request with a JSON response conforming to `schema`
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: Value,
    ) -> Result<Value>;
}
