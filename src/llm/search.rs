//! Abstract interface for search providers.

use crate::error::Result;
use async_trait::async_trait;

/// Abstract interface for a search service.
///
/// A provider takes a query and returns a pre-formatted text block of
/// results, ready to be embedded in a prompt. Result shaping (how many hits,
/// how much of each to quote) is the implementation's concern.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a search and return the results as prompt-ready text
    async fn search(&self, query: &str) -> Result<String>;
}
